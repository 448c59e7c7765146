//! Stats service: the inbound surface for the host application.
//!
//! One method per user action. Each recorder appends the engagement
//! event and applies an atomic counter delta against the stat record.
//! Recording is a best-effort side effect of the triggering action:
//! storage failures are logged and swallowed, never surfaced to the
//! user-facing caller. Liking a portfolio must not fail because its
//! stats row could not be touched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{EngagementAction, NewEngagementEvent, PortfolioId, StatRecord};
use crate::error::StatsError;
use crate::store::{EventStore, StatStore};

/// Real-time recorder and stat-record lifecycle manager.
///
/// Generic over the two store traits so the same logic runs against
/// PostgreSQL in production and [`crate::store::memory::MemoryStore`]
/// in tests.
///
/// Recorders append to the event log even when the portfolio has no
/// stat record yet; only the counter side is skipped. Once the
/// portfolio is published, the first rollup therefore counts any
/// pre-publication engagement still inside the window into `recent_*`.
/// This is a contract, not an accident: the log is the portfolio's
/// full engagement history regardless of visibility changes.
#[derive(Debug)]
pub struct StatsService<S, E> {
    stat_store: Arc<S>,
    event_store: Arc<E>,
}

impl<S, E> StatsService<S, E>
where
    S: StatStore,
    E: EventStore,
{
    /// Creates a new `StatsService` over the given stores.
    #[must_use]
    pub fn new(stat_store: Arc<S>, event_store: Arc<E>) -> Self {
        Self {
            stat_store,
            event_store,
        }
    }

    /// Creates the stat record when a portfolio is published.
    ///
    /// Idempotent: if a record already exists (e.g. a lazy read-path
    /// creation won the race) it is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`StatsError`] on storage failure.
    pub async fn init_stats(
        &self,
        portfolio_id: PortfolioId,
        published_at: DateTime<Utc>,
    ) -> Result<StatRecord, StatsError> {
        let record = self.stat_store.init_stats(portfolio_id, published_at).await?;
        tracing::debug!(%portfolio_id, "stat record ready");
        Ok(record)
    }

    /// Fetches the stat record for a read path, creating a zeroed one
    /// if the portfolio has none yet.
    ///
    /// `published_at` is only used when the record does not exist; an
    /// existing record keeps its original `first_published_at`.
    ///
    /// # Errors
    ///
    /// Returns a [`StatsError`] on storage failure.
    pub async fn get_or_create_stats(
        &self,
        portfolio_id: PortfolioId,
        published_at: DateTime<Utc>,
    ) -> Result<StatRecord, StatsError> {
        self.stat_store.init_stats(portfolio_id, published_at).await
    }

    /// Returns the stat record, or `None` if the portfolio has never
    /// been public.
    ///
    /// # Errors
    ///
    /// Returns a [`StatsError`] on storage failure.
    pub async fn find_stats(
        &self,
        portfolio_id: PortfolioId,
    ) -> Result<Option<StatRecord>, StatsError> {
        self.stat_store.find_stats(portfolio_id).await
    }

    /// Records a detail view.
    pub async fn record_view(&self, portfolio_id: PortfolioId, user_id: Uuid, now: DateTime<Utc>) {
        self.record(portfolio_id, user_id, EngagementAction::View, now)
            .await;
    }

    /// Records a like.
    pub async fn record_like(&self, portfolio_id: PortfolioId, user_id: Uuid, now: DateTime<Utc>) {
        self.record(portfolio_id, user_id, EngagementAction::Like, now)
            .await;
    }

    /// Records the withdrawal of a like. Clamps at zero if no matching
    /// like was ever counted.
    pub async fn record_unlike(
        &self,
        portfolio_id: PortfolioId,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) {
        self.record(portfolio_id, user_id, EngagementAction::Unlike, now)
            .await;
    }

    /// Records a comment. Only top-level comments count; replies in a
    /// thread are skipped entirely (no event, no counter).
    pub async fn record_comment(
        &self,
        portfolio_id: PortfolioId,
        user_id: Uuid,
        top_level: bool,
        now: DateTime<Utc>,
    ) {
        if !top_level {
            return;
        }
        self.record(portfolio_id, user_id, EngagementAction::Comment, now)
            .await;
    }

    /// Records the removal of a comment, with the same top-level rule
    /// as [`Self::record_comment`].
    pub async fn record_uncomment(
        &self,
        portfolio_id: PortfolioId,
        user_id: Uuid,
        top_level: bool,
        now: DateTime<Utc>,
    ) {
        if !top_level {
            return;
        }
        self.record(portfolio_id, user_id, EngagementAction::Uncomment, now)
            .await;
    }

    /// Records a share.
    pub async fn record_share(&self, portfolio_id: PortfolioId, user_id: Uuid, now: DateTime<Utc>) {
        self.record(portfolio_id, user_id, EngagementAction::Share, now)
            .await;
    }

    async fn record(
        &self,
        portfolio_id: PortfolioId,
        user_id: Uuid,
        action: EngagementAction,
        now: DateTime<Utc>,
    ) {
        match self.try_record(portfolio_id, user_id, action, now).await {
            Ok(true) => {}
            Ok(false) => {
                // No stat record: the portfolio is not public. Expected,
                // not an error; the event stays in the log regardless.
                tracing::debug!(%portfolio_id, action = action.as_str(), "no stat record, counter skipped");
            }
            Err(e) => {
                tracing::warn!(%portfolio_id, action = action.as_str(), error = %e, "stat update failed");
            }
        }
    }

    /// Appends the event and applies the counter delta. The two writes
    /// are separate statements; a crash in between leaves an event the
    /// counters never saw, which the next rollup absorbs for the
    /// rolling-window side.
    async fn try_record(
        &self,
        portfolio_id: PortfolioId,
        user_id: Uuid,
        action: EngagementAction,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError> {
        self.event_store
            .append(NewEngagementEvent {
                portfolio_id,
                user_id,
                action,
                occurred_at: now,
            })
            .await?;

        let (metric, delta) = action.metric_delta();
        self.stat_store
            .apply_delta(portfolio_id, metric, delta, now)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0) {
            chrono::LocalResult::Single(t) => t,
            _ => panic!("fixed timestamp"),
        }
    }

    fn make_service() -> (StatsService<MemoryStore, MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = StatsService::new(Arc::clone(&store), Arc::clone(&store));
        (service, store)
    }

    async fn fetch(
        service: &StatsService<MemoryStore, MemoryStore>,
        id: PortfolioId,
    ) -> StatRecord {
        let record = service.find_stats(id).await.ok().flatten();
        let Some(record) = record else {
            panic!("record missing");
        };
        record
    }

    #[tokio::test]
    async fn init_then_like_updates_both_counters() {
        let (service, _) = make_service();
        let id = PortfolioId::new();
        let user = Uuid::new_v4();

        let record = service.init_stats(id, t0()).await;
        let Ok(record) = record else {
            panic!("init failed");
        };
        assert_eq!(record.total_likes, 0);
        assert_eq!(record.recent_likes, 0);
        assert_eq!(record.first_published_at, t0());

        let now = t0() + chrono::Duration::hours(1);
        service.record_like(id, user, now).await;

        let record = fetch(&service, id).await;
        assert_eq!(record.total_likes, 1);
        assert_eq!(record.recent_likes, 1);
        assert_eq!(record.last_activity_at, Some(now));
    }

    #[tokio::test]
    async fn unlike_at_zero_clamps() {
        let (service, _) = make_service();
        let id = PortfolioId::new();
        let _ = service.init_stats(id, t0()).await;

        service.record_unlike(id, Uuid::new_v4(), t0()).await;

        let record = fetch(&service, id).await;
        assert_eq!(record.total_likes, 0);
        assert_eq!(record.recent_likes, 0);
    }

    #[tokio::test]
    async fn every_mutation_stamps_last_activity() {
        // Implemented contract: any counter mutation updates
        // last_activity_at, including unlike and share.
        let (service, _) = make_service();
        let id = PortfolioId::new();
        let user = Uuid::new_v4();
        let _ = service.init_stats(id, t0()).await;

        let t1 = t0() + chrono::Duration::minutes(1);
        service.record_share(id, user, t1).await;
        assert_eq!(fetch(&service, id).await.last_activity_at, Some(t1));

        let t2 = t0() + chrono::Duration::minutes(2);
        service.record_unlike(id, user, t2).await;
        assert_eq!(fetch(&service, id).await.last_activity_at, Some(t2));
    }

    #[tokio::test]
    async fn recorder_on_missing_record_is_silent_noop() {
        let (service, _) = make_service();
        let id = PortfolioId::new();

        service.record_view(id, Uuid::new_v4(), t0()).await;

        let found = service.find_stats(id).await;
        assert!(matches!(found, Ok(None)));
    }

    #[tokio::test]
    async fn reply_comments_do_not_count() {
        let (service, store) = make_service();
        let id = PortfolioId::new();
        let user = Uuid::new_v4();
        let _ = service.init_stats(id, t0()).await;

        service.record_comment(id, user, false, t0()).await;
        assert_eq!(store.event_count().await, 0);
        assert_eq!(fetch(&service, id).await.total_comments, 0);

        service.record_comment(id, user, true, t0()).await;
        assert_eq!(store.event_count().await, 1);
        assert_eq!(fetch(&service, id).await.total_comments, 1);
    }

    #[tokio::test]
    async fn uncomment_mirrors_comment() {
        let (service, _) = make_service();
        let id = PortfolioId::new();
        let user = Uuid::new_v4();
        let _ = service.init_stats(id, t0()).await;

        service.record_comment(id, user, true, t0()).await;
        service.record_uncomment(id, user, true, t0()).await;

        let record = fetch(&service, id).await;
        assert_eq!(record.total_comments, 0);
        assert_eq!(record.recent_comments, 0);
    }

    #[tokio::test]
    async fn get_or_create_twice_returns_same_record() {
        let (service, _) = make_service();
        let id = PortfolioId::new();

        let first = service.get_or_create_stats(id, t0()).await;
        let Ok(first) = first else {
            panic!("create failed");
        };

        service.record_view(id, Uuid::new_v4(), t0()).await;

        let later = t0() + chrono::Duration::days(1);
        let second = service.get_or_create_stats(id, later).await;
        let Ok(second) = second else {
            panic!("fetch failed");
        };
        assert_eq!(second.first_published_at, first.first_published_at);
        assert_eq!(second.total_views, 1);
    }

    #[tokio::test]
    async fn concurrent_likes_all_land() {
        let (service, store) = make_service();
        let id = PortfolioId::new();
        let _ = service.init_stats(id, t0()).await;
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.record_like(id, Uuid::new_v4(), t0()).await;
            }));
        }
        for handle in handles {
            let joined = handle.await;
            assert!(joined.is_ok());
        }

        let record = service.find_stats(id).await.ok().flatten();
        let Some(record) = record else {
            panic!("record missing");
        };
        assert_eq!(record.total_likes, 10);
        assert_eq!(record.recent_likes, 10);
        assert_eq!(store.event_count().await, 10);
    }
}
