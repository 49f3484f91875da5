//! The reconciliation run itself.
//!
//! Phase order: ledger row → store ping → authenticate → fetch both feeds
//! concurrently → merge → page the catalog computing diffs, draining full
//! concurrency windows of chunks as they accumulate → invalidate caches →
//! terminal ledger update. Fatal errors (auth, fetch, store connectivity)
//! abort the run and mark it `failed`; per-chunk write failures are
//! absorbed into the `failed` counter and the run still completes.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Context;
use novasync_core::{AppConfig, CanonicalProduct, UpdateDirective};
use novasync_db::{ApplyTotals, BatchApplier, RunTotals};
use novasync_erp::{ErpClient, FeedSelectors};
use sqlx::MySqlPool;

use super::metrics::RunDetails;

pub async fn run(config: &AppConfig, pool: &MySqlPool) -> anyhow::Result<()> {
    let client = build_erp_client(config)?;

    let run = novasync_db::create_sync_run(pool)
        .await
        .context("failed to create the sync run ledger record")?;
    tracing::info!(run_id = run.id, public_id = %run.public_id, "sync run started");
    let started = Instant::now();

    match execute(config, pool, &client).await {
        Ok((totals, details)) => {
            let run_totals = to_run_totals(totals, elapsed_ms(started));
            novasync_db::complete_sync_run(pool, run.id, run_totals, &details)
                .await
                .context("failed to record the completed run")?;
            if totals.failed > 0 {
                tracing::warn!(
                    run_id = run.id,
                    updated = totals.updated,
                    failed = totals.failed,
                    "sync run completed with failed directives"
                );
            } else {
                tracing::info!(
                    run_id = run.id,
                    updated = totals.updated,
                    published = totals.published,
                    drafted = totals.drafted,
                    duration_ms = run_totals.duration_ms,
                    "sync run completed"
                );
            }
            Ok(())
        }
        Err(error) => {
            let message = format!("{error:#}");
            tracing::error!(run_id = run.id, error = %message, "sync run failed");
            let run_totals = to_run_totals(ApplyTotals::default(), elapsed_ms(started));
            if let Err(ledger_error) =
                novasync_db::fail_sync_run(pool, run.id, &message, run_totals).await
            {
                tracing::error!(run_id = run.id, error = %ledger_error, "failed to record the failed run");
            }
            Err(error)
        }
    }
}

fn build_erp_client(config: &AppConfig) -> anyhow::Result<ErpClient> {
    let client = ErpClient::new(
        config.http_timeout_secs,
        &config.auth_url,
        &config.items_url,
        &config.prices_url,
        &config.erp_username,
        &config.erp_password,
        FeedSelectors {
            sucursal: config.sucursal.clone(),
            bodega: config.bodega.clone(),
            empresa: config.empresa.clone(),
        },
    )
    .context("failed to construct the ERP client")?;
    Ok(client)
}

async fn execute(
    config: &AppConfig,
    pool: &MySqlPool,
    client: &ErpClient,
) -> anyhow::Result<(ApplyTotals, serde_json::Value)> {
    let mut details = RunDetails::default();

    // Connectivity is checked before any reconciliation work; an
    // unreachable store fails the run immediately.
    novasync_db::ping(pool)
        .await
        .context("catalog store is unreachable")?;

    let phase = Instant::now();
    client
        .authenticate()
        .await
        .context("ERP authentication failed")?;
    details.phases.auth_ms = elapsed_ms(phase);
    tracing::info!("authenticated against the ERP");

    let phase = Instant::now();
    let (items, prices) = tokio::try_join!(client.fetch_items(), client.fetch_prices())
        .context("feed fetch failed")?;
    details.phases.fetch_ms = elapsed_ms(phase);
    details.item_records = items.len();
    details.price_records = prices.len();
    tracing::info!(
        items = details.item_records,
        prices = details.price_records,
        "feeds fetched"
    );

    let phase = Instant::now();
    let canonical = novasync_erp::merge(items, prices);
    details.phases.merge_ms = elapsed_ms(phase);
    details.canonical_records = canonical.len();
    tracing::info!(canonical = details.canonical_records, "feeds merged");

    let phase = Instant::now();
    let applier = BatchApplier::new(
        pool.clone(),
        &config.table_prefix,
        config.chunk_size,
        config.max_concurrent_chunks,
    );
    let totals = reconcile(config, pool, &applier, &canonical, &mut details).await?;
    details.phases.reconcile_ms = elapsed_ms(phase);

    let phase = Instant::now();
    if let Err(error) = novasync_db::invalidate_catalog_transients(pool, &config.table_prefix).await
    {
        tracing::warn!(error = %error, "cache invalidation failed; continuing");
    }
    details.phases.invalidate_ms = elapsed_ms(phase);

    let details = serde_json::to_value(&details).context("failed to serialize run details")?;
    Ok((totals, details))
}

/// Pages the catalog, diffing each row and applying directives in
/// transaction chunks. A full concurrency window of chunks dispatches as
/// soon as it accumulates; the remainder drains after the last page.
async fn reconcile(
    config: &AppConfig,
    pool: &MySqlPool,
    applier: &BatchApplier,
    canonical: &HashMap<String, CanonicalProduct>,
    details: &mut RunDetails,
) -> anyhow::Result<ApplyTotals> {
    let mut totals = ApplyTotals::default();
    let mut pending: Vec<UpdateDirective> = Vec::new();
    let mut ready: Vec<Vec<UpdateDirective>> = Vec::new();
    let mut after_id = 0u64;

    loop {
        let rows =
            novasync_db::fetch_catalog_page(pool, &config.table_prefix, after_id, config.page_size)
                .await
                .context("catalog page read failed")?;
        let Some(last_row) = rows.last() else {
            break;
        };
        after_id = last_row.id;
        details.catalog_pages += 1;
        details.catalog_rows += rows.len();

        let row_count = rows.len();
        let snapshots = novasync_db::to_snapshots(rows);
        details.skipped_rows += row_count - snapshots.len();

        for snapshot in &snapshots {
            if let Some(directive) = novasync_core::diff(snapshot, canonical) {
                details.directives += 1;
                pending.push(directive);
            }
        }

        ready.extend(cut_full_chunks(&mut pending, config.chunk_size));
        if ready.len() >= applier.window() {
            let batch = std::mem::take(&mut ready);
            details.chunks += batch.len();
            totals.merge(applier.apply_chunks(batch).await);
        }
    }

    if !pending.is_empty() {
        ready.push(std::mem::take(&mut pending));
    }
    if !ready.is_empty() {
        details.chunks += ready.len();
        totals.merge(applier.apply_chunks(ready).await);
    }

    Ok(totals)
}

/// Moves every full chunk out of `pending`, leaving the partial tail in
/// place for later pages to top up.
fn cut_full_chunks(
    pending: &mut Vec<UpdateDirective>,
    chunk_size: usize,
) -> Vec<Vec<UpdateDirective>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    while pending.len() >= chunk_size {
        chunks.push(pending.drain(..chunk_size).collect());
    }
    chunks
}

fn to_run_totals(totals: ApplyTotals, duration_ms: u64) -> RunTotals {
    RunTotals {
        total: clamp_i32(totals.updated + totals.failed),
        successful: clamp_i32(totals.updated),
        failed: clamp_i32(totals.failed),
        published: clamp_i32(totals.published),
        drafted: clamp_i32(totals.drafted),
        duration_ms: i64::try_from(duration_ms).unwrap_or(i64::MAX),
    }
}

fn clamp_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
