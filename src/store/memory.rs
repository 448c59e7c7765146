//! In-memory implementation of the storage layer.
//!
//! [`MemoryStore`] backs tests and demos with the same semantics as the
//! PostgreSQL store. Each mutation runs under the map's write lock,
//! which is the atomicity unit standing in for the database's
//! single-statement UPDATE.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{EventStore, StatStore};
use crate::domain::{
    EngagementAction, EngagementEvent, Metric, NewEngagementEvent, PortfolioId, RecentCounts,
    StatRecord,
};
use crate::error::StatsError;

/// In-process store holding stat records and the event log.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<PortfolioId, StatRecord>>,
    events: RwLock<Vec<EngagementEvent>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored events, for test assertions.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

fn apply_clamped(record: &mut StatRecord, metric: Metric, delta: i64) {
    let total = record.total(metric).saturating_add(delta).max(0);
    let recent = record.recent(metric).saturating_add(delta).max(0);
    match metric {
        Metric::Views => {
            record.total_views = total;
            record.recent_views = recent;
        }
        Metric::Likes => {
            record.total_likes = total;
            record.recent_likes = recent;
        }
        Metric::Shares => {
            record.total_shares = total;
            record.recent_shares = recent;
        }
        Metric::Comments => {
            record.total_comments = total;
            record.recent_comments = recent;
        }
    }
}

#[async_trait]
impl StatStore for MemoryStore {
    async fn init_stats(
        &self,
        portfolio_id: PortfolioId,
        published_at: DateTime<Utc>,
    ) -> Result<StatRecord, StatsError> {
        let mut map = self.records.write().await;
        let record = map
            .entry(portfolio_id)
            .or_insert_with(|| StatRecord::new(portfolio_id, published_at));
        Ok(record.clone())
    }

    async fn find_stats(
        &self,
        portfolio_id: PortfolioId,
    ) -> Result<Option<StatRecord>, StatsError> {
        Ok(self.records.read().await.get(&portfolio_id).cloned())
    }

    async fn apply_delta(
        &self,
        portfolio_id: PortfolioId,
        metric: Metric,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError> {
        let mut map = self.records.write().await;
        let Some(record) = map.get_mut(&portfolio_id) else {
            return Ok(false);
        };
        apply_clamped(record, metric, delta);
        record.last_activity_at = Some(now);
        record.updated_at = now;
        Ok(true)
    }

    async fn overwrite_recent(
        &self,
        portfolio_id: PortfolioId,
        counts: RecentCounts,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError> {
        let mut map = self.records.write().await;
        let Some(record) = map.get_mut(&portfolio_id) else {
            return Ok(false);
        };
        record.recent_views = counts.views;
        record.recent_likes = counts.likes;
        record.recent_shares = counts.shares;
        record.recent_comments = counts.comments;
        record.updated_at = now;
        Ok(true)
    }

    async fn list_portfolio_ids(&self) -> Result<Vec<PortfolioId>, StatsError> {
        let mut ids: Vec<PortfolioId> = self.records.read().await.keys().copied().collect();
        ids.sort_by_key(|id| *id.as_uuid());
        Ok(ids)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn append(&self, event: NewEngagementEvent) -> Result<i64, StatsError> {
        let mut events = self.events.write().await;
        let id = i64::try_from(events.len()).unwrap_or(i64::MAX).saturating_add(1);
        events.push(EngagementEvent {
            id,
            portfolio_id: event.portfolio_id,
            user_id: event.user_id,
            action: event.action,
            occurred_at: event.occurred_at,
        });
        Ok(id)
    }

    async fn count_actions_since(
        &self,
        portfolio_id: PortfolioId,
        action: EngagementAction,
        since: DateTime<Utc>,
    ) -> Result<i64, StatsError> {
        let events = self.events.read().await;
        let count = events
            .iter()
            .filter(|e| {
                e.portfolio_id == portfolio_id && e.action == action && e.occurred_at >= since
            })
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}
