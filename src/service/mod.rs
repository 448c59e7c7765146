//! Service layer: business logic orchestration.
//!
//! [`StatsService`] is the synchronous real-time path invoked per user
//! action; [`RollupJob`] is the out-of-band batch path that corrects
//! rolling-window drift from the event log.

pub mod rollup;
pub mod stats_service;

pub use rollup::{DEFAULT_WINDOW_DAYS, RollupJob, RollupReport};
pub use stats_service::StatsService;
