//! Rollup job: recomputes rolling-window counters from the event log.
//!
//! The real-time path adjusts `recent_*` optimistically and drifts
//! (races, retries, upstream double counts). This job is the eventual
//! source of truth: per portfolio and per metric it counts increment
//! and decrement events inside the trailing window and *overwrites* the
//! rolling counter with the net. Overwriting rather than adding is what
//! makes a rerun with no new events a no-op, so the job is safe to run
//! twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Metric, PortfolioId, RecentCounts};
use crate::error::StatsError;
use crate::store::{EventStore, StatStore};

/// Default trailing window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Aggregate outcome of one rollup run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RollupReport {
    /// Portfolios whose rolling counters were recomputed and written.
    pub succeeded: u64,
    /// Portfolios that failed or timed out; their counters are
    /// unchanged until the next run.
    pub failed: u64,
    /// Window the run used.
    pub window_days: u32,
}

/// Batch recomputation of rolling-window counters.
#[derive(Debug)]
pub struct RollupJob<S, E> {
    stat_store: Arc<S>,
    event_store: Arc<E>,
    portfolio_timeout: Duration,
}

impl<S, E> RollupJob<S, E>
where
    S: StatStore,
    E: EventStore,
{
    /// Creates a new job. `portfolio_timeout` bounds one portfolio's
    /// recomputation during a sweep.
    #[must_use]
    pub fn new(stat_store: Arc<S>, event_store: Arc<E>, portfolio_timeout: Duration) -> Self {
        Self {
            stat_store,
            event_store,
            portfolio_timeout,
        }
    }

    /// Runs a rollup over the trailing `window_days`.
    ///
    /// With `scope = Some(id)` only that portfolio is recomputed
    /// (operator on-demand path); with `None` the job sweeps every stat
    /// record. Portfolios are processed independently: one failure is
    /// logged and counted, never aborts the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidWindow`] for a zero-day window and
    /// [`StatsError::Storage`] if the sweep cannot enumerate stat
    /// records at all. Per-portfolio failures are reported in the
    /// [`RollupReport`], not as errors.
    pub async fn run(
        &self,
        window_days: u32,
        scope: Option<PortfolioId>,
        now: DateTime<Utc>,
    ) -> Result<RollupReport, StatsError> {
        if window_days == 0 {
            return Err(StatsError::InvalidWindow(window_days));
        }

        let ids = match scope {
            Some(id) => vec![id],
            None => self.stat_store.list_portfolio_ids().await?,
        };
        let window_start = now - chrono::Duration::days(i64::from(window_days));

        tracing::info!(
            portfolios = ids.len(),
            window_days,
            %window_start,
            "rollup starting"
        );

        let mut report = RollupReport {
            succeeded: 0,
            failed: 0,
            window_days,
        };

        for portfolio_id in ids {
            let outcome = tokio::time::timeout(
                self.portfolio_timeout,
                self.recompute_one(portfolio_id, window_start, now),
            )
            .await;

            match outcome {
                Ok(Ok(true)) => report.succeeded += 1,
                Ok(Ok(false)) => {
                    // Record gone between enumeration and write.
                    report.failed += 1;
                    tracing::warn!(%portfolio_id, "no stat record to update");
                }
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!(%portfolio_id, error = %e, "portfolio recompute failed");
                }
                Err(_) => {
                    report.failed += 1;
                    let e = StatsError::RecomputeTimeout { portfolio_id };
                    tracing::warn!(%portfolio_id, error = %e, "portfolio recompute timed out");
                }
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "rollup finished"
        );
        Ok(report)
    }

    /// Recounts all four metrics for one portfolio and overwrites its
    /// rolling counters. Returns `false` if the stat record is missing.
    async fn recompute_one(
        &self,
        portfolio_id: PortfolioId,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError> {
        let mut counts = RecentCounts::ZERO;
        for metric in Metric::ALL {
            let increments = self
                .event_store
                .count_actions_since(portfolio_id, metric.increment_action(), window_start)
                .await?;
            let decrements = match metric.decrement_action() {
                Some(action) => {
                    self.event_store
                        .count_actions_since(portfolio_id, action, window_start)
                        .await?
                }
                None => 0,
            };
            // Clamp the final net, not the intermediate subtraction.
            counts.set(metric, increments.saturating_sub(decrements).max(0));
        }

        self.stat_store
            .overwrite_recent(portfolio_id, counts, now)
            .await
    }
}
