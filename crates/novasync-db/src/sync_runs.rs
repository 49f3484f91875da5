//! Database operations for the `sync_runs` execution-history ledger.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `sync_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRunRow {
    pub id: u64,
    pub public_id: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total: i32,
    pub successful: i32,
    pub failed: i32,
    pub published_count: i32,
    pub drafted_count: i32,
    pub duration_ms: i64,
    pub error_message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Final counts reported when a run reaches a terminal state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    pub total: i32,
    pub successful: i32,
    pub failed: i32,
    pub published: i32,
    pub drafted: i32,
    pub duration_ms: i64,
}

const SELECT_COLUMNS: &str = "id, public_id, status, started_at, completed_at, \
     total, successful, failed, published_count, drafted_count, \
     duration_ms, error_message, details, created_at";

/// Creates a new run in `running` status with `started_at = NOW()` and
/// returns the full newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or fetch fails.
pub async fn create_sync_run(pool: &MySqlPool) -> Result<SyncRunRow, DbError> {
    let public_id = Uuid::new_v4().to_string();

    let result = sqlx::query(
        "INSERT INTO sync_runs (public_id, status, started_at) VALUES (?, 'running', NOW())",
    )
    .bind(&public_id)
    .execute(pool)
    .await?;

    get_sync_run(pool, result.last_insert_id()).await
}

/// Marks a run as `completed`, recording final counts, duration, and the
/// free-form performance details blob.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not in
/// `running` status, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_sync_run(
    pool: &MySqlPool,
    id: u64,
    totals: RunTotals,
    details: &serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'completed', completed_at = NOW(), \
             total = ?, successful = ?, failed = ?, \
             published_count = ?, drafted_count = ?, \
             duration_ms = ?, details = ? \
         WHERE id = ? AND status = 'running'",
    )
    .bind(totals.total)
    .bind(totals.successful)
    .bind(totals.failed)
    .bind(totals.published)
    .bind(totals.drafted)
    .bind(totals.duration_ms)
    .bind(details)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, recording the fatal error message and whatever
/// counts were accumulated before the abort.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not in
/// `running` status, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_run(
    pool: &MySqlPool,
    id: u64,
    error_message: &str,
    totals: RunTotals,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'failed', completed_at = NOW(), \
             total = ?, successful = ?, failed = ?, \
             published_count = ?, drafted_count = ?, \
             duration_ms = ?, error_message = ? \
         WHERE id = ? AND status = 'running'",
    )
    .bind(totals.total)
    .bind(totals.successful)
    .bind(totals.failed)
    .bind(totals.published)
    .bind(totals.drafted)
    .bind(totals.duration_ms)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_run(pool: &MySqlPool, id: u64) -> Result<SyncRunRow, DbError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM sync_runs WHERE id = ?");
    let row = sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_runs(pool: &MySqlPool, limit: i64) -> Result<Vec<SyncRunRow>, DbError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM sync_runs ORDER BY created_at DESC, id DESC LIMIT ?"
    );
    let rows = sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
