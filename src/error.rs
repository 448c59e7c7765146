//! Statistics subsystem error types.
//!
//! [`StatsError`] is the central error type. Missing stat records and
//! zero-clamped decrements are deliberately *not* errors: both are
//! expected outcomes of the relaxed consistency model and are handled
//! in place by the stores.

/// Server-side error enum for the statistics core.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// Storage backend failure (query, connection, or migration).
    #[error("storage error: {0}")]
    Storage(String),

    /// Rollup invoked with a zero-length window.
    #[error("invalid rollup window: {0} days")]
    InvalidWindow(u32),

    /// A single portfolio's recomputation exceeded its time budget.
    #[error("recompute timed out for portfolio {portfolio_id}")]
    RecomputeTimeout {
        /// Portfolio whose recomputation was abandoned.
        portfolio_id: crate::domain::PortfolioId,
    },
}

impl From<sqlx::Error> for StatsError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StatsError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(e.to_string())
    }
}
