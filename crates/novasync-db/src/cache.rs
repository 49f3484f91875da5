//! Post-run invalidation of catalog transient caches.

use sqlx::MySqlPool;

/// Naming prefix of the catalog transients this engine invalidates.
const CACHE_PREFIX: &str = "wc";

/// Deletes all catalog transient rows (values and their timeout
/// companions) in one transaction. Returns the number of rows removed.
///
/// Callers treat failure as non-fatal: the run still completes, stale
/// cache entries simply age out on their own.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the delete or commit fails.
pub async fn invalidate_catalog_transients(
    pool: &MySqlPool,
    prefix: &str,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let sql = format!("DELETE FROM {prefix}options WHERE option_name LIKE ? OR option_name LIKE ?");
    let deleted = sqlx::query(&sql)
        .bind(format!("_transient_{CACHE_PREFIX}_%"))
        .bind(format!("_transient_timeout_{CACHE_PREFIX}_%"))
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    tracing::info!(deleted, "catalog transients invalidated");
    Ok(deleted)
}
