//! Domain layer: portfolio identity, engagement events, and stat records.
//!
//! This module contains the core model: the portfolio identifier, the
//! append-only engagement event shape, the per-counter metric mapping,
//! and the per-portfolio statistics record mutated by the real-time
//! recorder and the rollup job.

pub mod engagement;
pub mod portfolio_id;
pub mod stat_record;

pub use engagement::{EngagementAction, EngagementEvent, Metric, NewEngagementEvent};
pub use portfolio_id::PortfolioId;
pub use stat_record::{RecentCounts, StatRecord};
