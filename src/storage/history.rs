//! Per-user scan history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use sqlx::{Pool, Row, Sqlite};

use crate::config::HISTORY_MAX_LIMIT;
use crate::error_handling::DatabaseError;
use crate::models::ScanResult;

/// Filters for history listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    /// Only scans of this host.
    pub host: Option<String>,
    /// Only scans created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Maximum rows; clamped to `HISTORY_MAX_LIMIT`.
    pub limit: Option<u32>,
}

impl HistoryFilter {
    fn effective_limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(HISTORY_MAX_LIMIT).clamp(1, HISTORY_MAX_LIMIT))
    }
}

/// Storage for completed scans, keyed by user.
pub trait HistoryStore: Send + Sync {
    /// Records `result` for `user_id`.
    fn append<'a>(
        &'a self,
        user_id: &'a str,
        result: &'a ScanResult,
    ) -> BoxFuture<'a, Result<(), DatabaseError>>;

    /// Lists `user_id`'s scans, newest first.
    fn list<'a>(
        &'a self,
        user_id: &'a str,
        filter: &'a HistoryFilter,
    ) -> BoxFuture<'a, Result<Vec<ScanResult>, DatabaseError>>;

    /// Deletes scans created before `cutoff`; returns how many.
    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> BoxFuture<'_, Result<u64, DatabaseError>>;

    /// Cheap liveness probe for health checks.
    fn ping(&self) -> BoxFuture<'_, Result<(), DatabaseError>>;
}

/// SQLite-backed history.
#[derive(Clone)]
pub struct SqliteHistory {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteHistory {
    /// Wraps a pool whose schema is already migrated.
    pub fn new(pool: Arc<Pool<Sqlite>>) -> Self {
        Self { pool }
    }

    async fn insert(&self, user_id: &str, result: &ScanResult) -> Result<(), DatabaseError> {
        let report = serde_json::to_string(result)?;
        sqlx::query(
            "INSERT INTO scan_history (user_id, host, score, grade, created_at, report)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(result.target.host.as_str())
        .bind(i64::from(result.score))
        .bind(result.grade.label())
        .bind(result.created_at.timestamp_millis())
        .bind(report)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn select(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<ScanResult>, DatabaseError> {
        let host = filter.host.as_deref().map(str::to_ascii_lowercase);
        let since = filter.since.map(|t| t.timestamp_millis());
        let rows = sqlx::query(
            "SELECT report FROM scan_history
             WHERE user_id = ?
               AND (? IS NULL OR host = ?)
               AND (? IS NULL OR created_at >= ?)
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(host.as_deref())
        .bind(host.as_deref())
        .bind(since)
        .bind(since)
        .bind(filter.effective_limit())
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let report: String = row.try_get("report")?;
            results.push(serde_json::from_str(&report)?);
        }
        Ok(results)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let done = sqlx::query("DELETE FROM scan_history WHERE created_at < ?")
            .bind(cutoff.timestamp_millis())
            .execute(self.pool.as_ref())
            .await?;
        Ok(done.rows_affected())
    }

    async fn select_one(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

impl HistoryStore for SqliteHistory {
    fn append<'a>(
        &'a self,
        user_id: &'a str,
        result: &'a ScanResult,
    ) -> BoxFuture<'a, Result<(), DatabaseError>> {
        Box::pin(self.insert(user_id, result))
    }

    fn list<'a>(
        &'a self,
        user_id: &'a str,
        filter: &'a HistoryFilter,
    ) -> BoxFuture<'a, Result<Vec<ScanResult>, DatabaseError>> {
        Box::pin(self.select(user_id, filter))
    }

    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> BoxFuture<'_, Result<u64, DatabaseError>> {
        Box::pin(self.delete_before(cutoff))
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), DatabaseError>> {
        Box::pin(self.select_one())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::sample_result;
    use crate::storage::{init_memory_pool, run_migrations};
    use chrono::Duration;

    async fn store() -> SqliteHistory {
        let pool = init_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteHistory::new(pool)
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let history = store().await;
        let mut older = sample_result("a.test");
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = sample_result("b.test");

        history.append("u1", &older).await.unwrap();
        history.append("u1", &newer).await.unwrap();
        history.append("u2", &newer).await.unwrap();

        let listed = history.list("u1", &HistoryFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].target.host, "b.test");
        assert_eq!(listed[1], older);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let history = store().await;
        let mut old = sample_result("a.test");
        old.created_at = Utc::now() - Duration::days(2);
        history.append("u1", &old).await.unwrap();
        history.append("u1", &sample_result("a.test")).await.unwrap();
        history.append("u1", &sample_result("b.test")).await.unwrap();

        let by_host = HistoryFilter {
            host: Some("A.TEST".to_string()),
            ..HistoryFilter::default()
        };
        assert_eq!(history.list("u1", &by_host).await.unwrap().len(), 2);

        let recent = HistoryFilter {
            since: Some(Utc::now() - Duration::days(1)),
            ..HistoryFilter::default()
        };
        assert_eq!(history.list("u1", &recent).await.unwrap().len(), 2);

        let limited = HistoryFilter {
            limit: Some(1),
            ..HistoryFilter::default()
        };
        assert_eq!(history.list("u1", &limited).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prune_older_than() {
        let history = store().await;
        let mut old = sample_result("a.test");
        old.created_at = Utc::now() - Duration::days(91);
        history.append("u1", &old).await.unwrap();
        history.append("u1", &sample_result("a.test")).await.unwrap();

        let removed = history
            .prune_older_than(Utc::now() - Duration::days(90))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        history.ping().await.unwrap();
        assert_eq!(
            history.list("u1", &HistoryFilter::default()).await.unwrap().len(),
            1
        );
    }
}
