//! Storage layer: stat records and the append-only engagement event log.
//!
//! Two traits split the persisted state along its two tables. The
//! production backend is [`postgres::PostgresStore`]; [`memory::MemoryStore`]
//! implements the same semantics in-process for tests and demos.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    EngagementAction, Metric, NewEngagementEvent, PortfolioId, RecentCounts, StatRecord,
};
use crate::error::StatsError;

/// Storage operations for per-portfolio stat records.
#[async_trait]
pub trait StatStore: Send + Sync {
    /// Finds or creates the stat record for a portfolio.
    ///
    /// Creation zeroes every counter and stamps `first_published_at`
    /// with `published_at`. If a record already exists it is returned
    /// unchanged, so racing lazy-creation and publish-time creation
    /// paths is safe.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] on backend failure.
    async fn init_stats(
        &self,
        portfolio_id: PortfolioId,
        published_at: DateTime<Utc>,
    ) -> Result<StatRecord, StatsError>;

    /// Returns the stat record for a portfolio, or `None` if the
    /// portfolio has never been public. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] on backend failure.
    async fn find_stats(
        &self,
        portfolio_id: PortfolioId,
    ) -> Result<Option<StatRecord>, StatsError>;

    /// Atomically adjusts one metric's lifetime and rolling counters by
    /// `delta`, clamping both at zero, and stamps `last_activity_at`.
    ///
    /// The adjustment happens at the storage layer (single UPDATE or
    /// under the store's write lock), never as a read-modify-write in
    /// application memory, so concurrent deltas on the same portfolio
    /// cannot lose updates.
    ///
    /// Returns `false` when no record exists for the portfolio; the
    /// call is then a no-op and must not create one.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] on backend failure.
    async fn apply_delta(
        &self,
        portfolio_id: PortfolioId,
        metric: Metric,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError>;

    /// Overwrites all four rolling-window counters with `counts`.
    ///
    /// This is the rollup's write path: always a replacement, never an
    /// addition, which is what makes recomputation idempotent. Does not
    /// touch `last_activity_at`.
    ///
    /// Returns `false` when no record exists for the portfolio.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] on backend failure.
    async fn overwrite_recent(
        &self,
        portfolio_id: PortfolioId,
        counts: RecentCounts,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError>;

    /// Enumerates every portfolio that has a stat record, for the full
    /// sweep. Failure here aborts the whole rollup run.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] on backend failure.
    async fn list_portfolio_ids(&self) -> Result<Vec<PortfolioId>, StatsError>;
}

/// Storage operations for the append-only engagement event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one event, returning its row id. Events are immutable
    /// once written.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] on backend failure.
    async fn append(&self, event: NewEngagementEvent) -> Result<i64, StatsError>;

    /// Counts events of `action` for `portfolio_id` with
    /// `occurred_at >= since`.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] on backend failure.
    async fn count_actions_since(
        &self,
        portfolio_id: PortfolioId,
        action: EngagementAction,
        since: DateTime<Utc>,
    ) -> Result<i64, StatsError>;
}
