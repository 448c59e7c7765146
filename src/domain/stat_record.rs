//! The per-portfolio statistics row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Metric, PortfolioId};

/// One statistics row per portfolio, keyed by the portfolio identity.
///
/// Lifetime (`total_*`) counters are maintained only by the real-time
/// path. Rolling-window (`recent_*`) counters are authoritative right
/// after a rollup and best-effort in between, when the real-time path
/// adjusts them optimistically.
///
/// All counters are non-negative at all times; the stores clamp at zero
/// on decrement. `recent_* <= total_*` is not a hard invariant (see
/// [`StatRecord::anomalies`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRecord {
    /// Owning portfolio; primary key.
    pub portfolio_id: PortfolioId,
    /// Lifetime view count.
    pub total_views: i64,
    /// Lifetime like count, net of unlikes.
    pub total_likes: i64,
    /// Lifetime share count.
    pub total_shares: i64,
    /// Lifetime top-level comment count, net of removals.
    pub total_comments: i64,
    /// Views within the rolling window.
    pub recent_views: i64,
    /// Likes within the rolling window.
    pub recent_likes: i64,
    /// Shares within the rolling window.
    pub recent_shares: i64,
    /// Top-level comments within the rolling window.
    pub recent_comments: i64,
    /// When the portfolio first became public. Set once, immutable.
    pub first_published_at: DateTime<Utc>,
    /// Last counter-affecting action. `None` until the first action.
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Last write to this row, by either the recorder or the rollup.
    pub updated_at: DateTime<Utc>,
}

impl StatRecord {
    /// Creates a zeroed record for a portfolio published at `published_at`.
    #[must_use]
    pub fn new(portfolio_id: PortfolioId, published_at: DateTime<Utc>) -> Self {
        Self {
            portfolio_id,
            total_views: 0,
            total_likes: 0,
            total_shares: 0,
            total_comments: 0,
            recent_views: 0,
            recent_likes: 0,
            recent_shares: 0,
            recent_comments: 0,
            first_published_at: published_at,
            last_activity_at: None,
            updated_at: published_at,
        }
    }

    /// Returns the lifetime counter for `metric`.
    #[must_use]
    pub const fn total(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Views => self.total_views,
            Metric::Likes => self.total_likes,
            Metric::Shares => self.total_shares,
            Metric::Comments => self.total_comments,
        }
    }

    /// Returns the rolling-window counter for `metric`.
    #[must_use]
    pub const fn recent(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Views => self.recent_views,
            Metric::Likes => self.recent_likes,
            Metric::Shares => self.recent_shares,
            Metric::Comments => self.recent_comments,
        }
    }

    /// Returns the metrics whose rolling counter exceeds the lifetime one.
    ///
    /// A non-empty result is a bug signal (concurrent-write anomaly), not
    /// a crash condition. Callers log it and move on.
    #[must_use]
    pub fn anomalies(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.recent(*m) > self.total(*m))
            .collect()
    }
}

/// The four rolling-window values produced by one rollup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentCounts {
    /// Net views in the window.
    pub views: i64,
    /// Net likes in the window.
    pub likes: i64,
    /// Net shares in the window.
    pub shares: i64,
    /// Net top-level comments in the window.
    pub comments: i64,
}

impl RecentCounts {
    /// All four counts zero.
    pub const ZERO: Self = Self {
        views: 0,
        likes: 0,
        shares: 0,
        comments: 0,
    };

    /// Returns the count for `metric`.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Views => self.views,
            Metric::Likes => self.likes,
            Metric::Shares => self.shares,
            Metric::Comments => self.comments,
        }
    }

    /// Sets the count for `metric`.
    pub const fn set(&mut self, metric: Metric, value: i64) {
        match metric {
            Metric::Views => self.views = value,
            Metric::Likes => self.likes = value,
            Metric::Shares => self.shares = value,
            Metric::Comments => self.comments = value,
        }
    }
}
