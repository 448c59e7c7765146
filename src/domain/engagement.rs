//! Engagement actions, metrics, and the append-only event rows.
//!
//! Every user action that touches a counter is one [`EngagementAction`].
//! Each counter is one [`Metric`], which names the action that increments
//! it and (for likes and comments) the action that decrements it. The
//! rollup walks [`Metric::ALL`] and recounts each from the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PortfolioId;

/// A discrete engagement action performed by a user on a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementAction {
    /// Portfolio detail view.
    View,
    /// Portfolio liked.
    Like,
    /// A previous like withdrawn.
    Unlike,
    /// Top-level comment posted.
    Comment,
    /// Top-level comment removed.
    Uncomment,
    /// Portfolio shared.
    Share,
}

impl EngagementAction {
    /// Returns the action as the stable string stored in the events table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Like => "like",
            Self::Unlike => "unlike",
            Self::Comment => "comment",
            Self::Uncomment => "uncomment",
            Self::Share => "share",
        }
    }

    /// Returns the counter this action touches and the delta it applies.
    #[must_use]
    pub const fn metric_delta(self) -> (Metric, i64) {
        match self {
            Self::View => (Metric::Views, 1),
            Self::Like => (Metric::Likes, 1),
            Self::Unlike => (Metric::Likes, -1),
            Self::Comment => (Metric::Comments, 1),
            Self::Uncomment => (Metric::Comments, -1),
            Self::Share => (Metric::Shares, 1),
        }
    }

    /// Parses the stored string form back into an action.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view" => Some(Self::View),
            "like" => Some(Self::Like),
            "unlike" => Some(Self::Unlike),
            "comment" => Some(Self::Comment),
            "uncomment" => Some(Self::Uncomment),
            "share" => Some(Self::Share),
            _ => None,
        }
    }
}

/// One of the four engagement counters carried by a stat record.
///
/// A metric pairs an increment action with an optional decrement action.
/// Views and shares are monotonic: there is no "unview" or "unshare".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Detail views.
    Views,
    /// Likes net of unlikes.
    Likes,
    /// Shares.
    Shares,
    /// Top-level comments net of removals.
    Comments,
}

impl Metric {
    /// All metrics, in stat-record column order.
    pub const ALL: [Self; 4] = [Self::Views, Self::Likes, Self::Shares, Self::Comments];

    /// The action that increments this metric by one.
    #[must_use]
    pub const fn increment_action(self) -> EngagementAction {
        match self {
            Self::Views => EngagementAction::View,
            Self::Likes => EngagementAction::Like,
            Self::Shares => EngagementAction::Share,
            Self::Comments => EngagementAction::Comment,
        }
    }

    /// The action that decrements this metric, if one exists.
    #[must_use]
    pub const fn decrement_action(self) -> Option<EngagementAction> {
        match self {
            Self::Likes => Some(EngagementAction::Unlike),
            Self::Comments => Some(EngagementAction::Uncomment),
            Self::Views | Self::Shares => None,
        }
    }

    /// Column name of the lifetime counter for this metric.
    #[must_use]
    pub const fn total_column(self) -> &'static str {
        match self {
            Self::Views => "total_views",
            Self::Likes => "total_likes",
            Self::Shares => "total_shares",
            Self::Comments => "total_comments",
        }
    }

    /// Column name of the rolling-window counter for this metric.
    #[must_use]
    pub const fn recent_column(self) -> &'static str {
        match self {
            Self::Views => "recent_views",
            Self::Likes => "recent_likes",
            Self::Shares => "recent_shares",
            Self::Comments => "recent_comments",
        }
    }
}

/// An engagement event not yet persisted (no row id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEngagementEvent {
    /// Target portfolio.
    pub portfolio_id: PortfolioId,
    /// Acting user.
    pub user_id: Uuid,
    /// What the user did.
    pub action: EngagementAction,
    /// When it happened. Set at write time, never updated.
    pub occurred_at: DateTime<Utc>,
}

/// A stored event row from the `engagement_events` table.
///
/// Immutable once written; the log is append-only and is the source of
/// truth for rolling-window recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Target portfolio.
    pub portfolio_id: PortfolioId,
    /// Acting user.
    pub user_id: Uuid,
    /// What the user did.
    pub action: EngagementAction,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}
