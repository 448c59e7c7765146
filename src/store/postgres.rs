//! PostgreSQL implementation of the storage layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{EventStore, StatStore};
use crate::domain::{
    EngagementAction, Metric, NewEngagementEvent, PortfolioId, RecentCounts, StatRecord,
};
use crate::error::StatsError;

/// PostgreSQL-backed storage for stat records and the event log,
/// using `sqlx::PgPool`.
///
/// Counter adjustments are single `UPDATE` statements with
/// `GREATEST(col + delta, 0)` expressions, so concurrent deltas on the
/// same row serialize inside the database and can neither lose updates
/// nor go negative.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Raw row shape of the `portfolio_stats` table.
#[derive(Debug, sqlx::FromRow)]
struct StatRow {
    portfolio_id: Uuid,
    total_views: i64,
    total_likes: i64,
    total_shares: i64,
    total_comments: i64,
    recent_views: i64,
    recent_likes: i64,
    recent_shares: i64,
    recent_comments: i64,
    first_published_at: DateTime<Utc>,
    last_activity_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

const STAT_COLUMNS: &str = "portfolio_id, total_views, total_likes, total_shares, \
     total_comments, recent_views, recent_likes, recent_shares, recent_comments, \
     first_published_at, last_activity_at, updated_at";

impl From<StatRow> for StatRecord {
    fn from(row: StatRow) -> Self {
        Self {
            portfolio_id: PortfolioId::from_uuid(row.portfolio_id),
            total_views: row.total_views,
            total_likes: row.total_likes,
            total_shares: row.total_shares,
            total_comments: row.total_comments,
            recent_views: row.recent_views,
            recent_likes: row.recent_likes,
            recent_shares: row.recent_shares,
            recent_comments: row.recent_comments,
            first_published_at: row.first_published_at,
            last_activity_at: row.last_activity_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StatsError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch_stats(
        &self,
        portfolio_id: PortfolioId,
    ) -> Result<Option<StatRecord>, StatsError> {
        let row = sqlx::query_as::<_, StatRow>(&format!(
            "SELECT {STAT_COLUMNS} FROM portfolio_stats WHERE portfolio_id = $1",
        ))
        .bind(portfolio_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StatRecord::from))
    }
}

#[async_trait]
impl StatStore for PostgresStore {
    async fn init_stats(
        &self,
        portfolio_id: PortfolioId,
        published_at: DateTime<Utc>,
    ) -> Result<StatRecord, StatsError> {
        // ON CONFLICT DO NOTHING keeps creation idempotent under races
        // between publish-time and lazy-read creation paths.
        sqlx::query(
            "INSERT INTO portfolio_stats (portfolio_id, first_published_at, updated_at) \
             VALUES ($1, $2, $2) ON CONFLICT (portfolio_id) DO NOTHING",
        )
        .bind(portfolio_id.as_uuid())
        .bind(published_at)
        .execute(&self.pool)
        .await?;

        self.fetch_stats(portfolio_id).await?.ok_or_else(|| {
            StatsError::Storage(format!("stat record vanished after init: {portfolio_id}"))
        })
    }

    async fn find_stats(
        &self,
        portfolio_id: PortfolioId,
    ) -> Result<Option<StatRecord>, StatsError> {
        self.fetch_stats(portfolio_id).await
    }

    async fn apply_delta(
        &self,
        portfolio_id: PortfolioId,
        metric: Metric,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError> {
        // Column names come from Metric's static mapping, never from input.
        let total = metric.total_column();
        let recent = metric.recent_column();
        let sql = format!(
            "UPDATE portfolio_stats SET \
             {total} = GREATEST({total} + $2, 0), \
             {recent} = GREATEST({recent} + $2, 0), \
             last_activity_at = $3, updated_at = $3 \
             WHERE portfolio_id = $1",
        );

        let result = sqlx::query(&sql)
            .bind(portfolio_id.as_uuid())
            .bind(delta)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn overwrite_recent(
        &self,
        portfolio_id: PortfolioId,
        counts: RecentCounts,
        now: DateTime<Utc>,
    ) -> Result<bool, StatsError> {
        let result = sqlx::query(
            "UPDATE portfolio_stats SET \
             recent_views = $2, recent_likes = $3, recent_shares = $4, \
             recent_comments = $5, updated_at = $6 \
             WHERE portfolio_id = $1",
        )
        .bind(portfolio_id.as_uuid())
        .bind(counts.views)
        .bind(counts.likes)
        .bind(counts.shares)
        .bind(counts.comments)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_portfolio_ids(&self) -> Result<Vec<PortfolioId>, StatsError> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            "SELECT portfolio_id FROM portfolio_stats ORDER BY portfolio_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PortfolioId::from_uuid).collect())
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn append(&self, event: NewEngagementEvent) -> Result<i64, StatsError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO engagement_events (portfolio_id, user_id, action, occurred_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(event.portfolio_id.as_uuid())
        .bind(event.user_id)
        .bind(event.action.as_str())
        .bind(event.occurred_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn count_actions_since(
        &self,
        portfolio_id: PortfolioId,
        action: EngagementAction,
        since: DateTime<Utc>,
    ) -> Result<i64, StatsError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM engagement_events \
             WHERE portfolio_id = $1 AND action = $2 AND occurred_at >= $3",
        )
        .bind(portfolio_id.as_uuid())
        .bind(action.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
