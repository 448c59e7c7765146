//! Daily rollup trigger.
//!
//! Sleeps until the configured local hour (02:00 by default), runs a
//! full sweep with the configured window, and repeats. The sweep is the
//! single writer of rolling-window counters; the job itself stays
//! idempotent, so an accidental double run is harmless.

use chrono::{Local, NaiveDateTime};

use crate::error::StatsError;
use crate::service::RollupJob;
use crate::store::{EventStore, StatStore};

/// Time until the next `hour:00` strictly after `now`.
///
/// Pure so tests can probe it with fixed timestamps. Works on naive
/// local time; the daily resolution makes DST shifts a non-issue for
/// this job.
#[must_use]
pub fn duration_until_next_run(now: NaiveDateTime, hour: u32) -> std::time::Duration {
    let Some(mut target) = now.date().and_hms_opt(hour.min(23), 0, 0) else {
        return std::time::Duration::from_secs(86_400);
    };
    if target <= now {
        target += chrono::Duration::days(1);
    }
    (target - now).to_std().unwrap_or_default()
}

/// Runs the daily full-sweep loop forever.
///
/// A failed run is logged for the operator and the loop continues; the
/// next day's sweep recovers any portfolio left stale.
///
/// # Errors
///
/// Does not return under normal operation; the `Result` type keeps the
/// call site uniform with the one-shot path.
pub async fn run_daily<S, E>(
    job: &RollupJob<S, E>,
    window_days: u32,
    hour: u32,
) -> Result<(), StatsError>
where
    S: StatStore,
    E: EventStore,
{
    loop {
        let wait = duration_until_next_run(Local::now().naive_local(), hour);
        tracing::info!(wait_secs = wait.as_secs(), hour, "sleeping until next rollup");
        tokio::time::sleep(wait).await;

        match job.run(window_days, None, chrono::Utc::now()).await {
            Ok(report) => {
                tracing::info!(
                    succeeded = report.succeeded,
                    failed = report.failed,
                    window_days = report.window_days,
                    "daily rollup complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "daily rollup run failed");
            }
        }
    }
}
