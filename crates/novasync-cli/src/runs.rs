//! `runs` subcommand: print recent ledger entries.

use sqlx::MySqlPool;

pub async fn list(pool: &MySqlPool, limit: i64) -> anyhow::Result<()> {
    let runs = novasync_db::list_sync_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no sync runs recorded yet");
        return Ok(());
    }

    for run in runs {
        println!(
            "#{} {} {:<9} total={} ok={} failed={} published={} drafted={} {}ms",
            run.id,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.status,
            run.total,
            run.successful,
            run.failed,
            run.published_count,
            run.drafted_count,
            run.duration_ms,
        );
        if let Some(error) = run.error_message {
            println!("    error: {error}");
        }
    }

    Ok(())
}
