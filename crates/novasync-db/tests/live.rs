//! Live integration tests against a real MySQL catalog schema.
//!
//! Gated on `NOVASYNC_TEST_DATABASE_URL`: when the variable is unset the
//! tests skip silently, so the suite stays green on machines without a
//! MySQL server. Each test works under its own table prefix.

use novasync_core::{PriceUpdate, ProductStatus, UpdateDirective};
use novasync_db::{
    complete_sync_run, create_sync_run, fetch_catalog_page, get_sync_run,
    invalidate_catalog_transients, to_snapshots, BatchApplier, DbError, PoolConfig, RunTotals,
};
use sqlx::MySqlPool;

async fn test_pool() -> Option<MySqlPool> {
    let Ok(url) = std::env::var("NOVASYNC_TEST_DATABASE_URL") else {
        eprintln!("NOVASYNC_TEST_DATABASE_URL not set; skipping live DB test");
        return None;
    };
    Some(
        novasync_db::connect_pool(&url, PoolConfig::default())
            .await
            .expect("failed to connect to the test database"),
    )
}

/// Drops and recreates the catalog tables under `prefix`. `with_lookup`
/// controls whether the lookup-projection table exists, so atomicity tests
/// can force a mid-transaction failure.
async fn reset_schema(pool: &MySqlPool, prefix: &str, with_lookup: bool) {
    for table in ["posts", "postmeta", "wc_product_meta_lookup", "options"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {prefix}{table}"))
            .execute(pool)
            .await
            .expect("drop table");
    }
    sqlx::query(&format!(
        "CREATE TABLE {prefix}posts (\
             ID BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
             post_status VARCHAR(20) NOT NULL DEFAULT 'draft', \
             post_type VARCHAR(20) NOT NULL DEFAULT 'product', \
             post_modified DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP, \
             post_modified_gmt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP)"
    ))
    .execute(pool)
    .await
    .expect("create posts");
    sqlx::query(&format!(
        "CREATE TABLE {prefix}postmeta (\
             meta_id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
             post_id BIGINT UNSIGNED NOT NULL, \
             meta_key VARCHAR(255) NULL, \
             meta_value LONGTEXT NULL, \
             KEY post_id (post_id), KEY meta_key (meta_key(191)))"
    ))
    .execute(pool)
    .await
    .expect("create postmeta");
    if with_lookup {
        sqlx::query(&format!(
            "CREATE TABLE {prefix}wc_product_meta_lookup (\
                 product_id BIGINT UNSIGNED NOT NULL PRIMARY KEY, \
                 stock_quantity BIGINT NULL, \
                 stock_status VARCHAR(100) NULL DEFAULT 'instock', \
                 min_price DECIMAL(19,4) NULL, \
                 max_price DECIMAL(19,4) NULL, \
                 onsale TINYINT(1) NULL DEFAULT 0)"
        ))
        .execute(pool)
        .await
        .expect("create lookup");
    }
    sqlx::query(&format!(
        "CREATE TABLE {prefix}options (\
             option_id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
             option_name VARCHAR(191) NOT NULL UNIQUE, \
             option_value LONGTEXT NOT NULL)"
    ))
    .execute(pool)
    .await
    .expect("create options");
}

async fn insert_product(pool: &MySqlPool, prefix: &str, status: &str, sku: &str) -> u64 {
    let id = sqlx::query(&format!(
        "INSERT INTO {prefix}posts (post_status, post_type) VALUES (?, 'product')"
    ))
    .bind(status)
    .execute(pool)
    .await
    .expect("insert post")
    .last_insert_id();
    set_meta(pool, prefix, id, "_sku", sku).await;
    id
}

async fn set_meta(pool: &MySqlPool, prefix: &str, id: u64, key: &str, value: &str) {
    sqlx::query(&format!(
        "INSERT INTO {prefix}postmeta (post_id, meta_key, meta_value) VALUES (?, ?, ?)"
    ))
    .bind(id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .expect("insert meta");
}

async fn meta_value(pool: &MySqlPool, prefix: &str, id: u64, key: &str) -> Option<String> {
    sqlx::query_scalar::<_, String>(&format!(
        "SELECT meta_value FROM {prefix}postmeta WHERE post_id = ? AND meta_key = ?"
    ))
    .bind(id)
    .bind(key)
    .fetch_optional(pool)
    .await
    .expect("read meta")
}

async fn post_status(pool: &MySqlPool, prefix: &str, id: u64) -> String {
    sqlx::query_scalar::<_, String>(&format!("SELECT post_status FROM {prefix}posts WHERE ID = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("read status")
}

fn publish_directive(id: u64) -> UpdateDirective {
    UpdateDirective {
        id,
        stock: 10,
        status: Some(ProductStatus::Publish),
        prices: Some(PriceUpdate {
            regular: "100".parse().unwrap(),
            sale: Some("80".parse().unwrap()),
        }),
        effective_price: "80".parse().unwrap(),
        on_sale: true,
    }
}

#[tokio::test]
async fn cursor_visits_every_row_exactly_once() {
    let Some(pool) = test_pool().await else { return };
    let prefix = "nstest_cursor_";
    reset_schema(&pool, prefix, true).await;

    let mut expected = Vec::new();
    for n in 0..25 {
        expected.push(insert_product(&pool, prefix, "draft", &format!("SKU-{n}")).await);
    }

    let mut seen = Vec::new();
    let mut after_id = 0u64;
    let mut non_empty_pages = 0usize;
    loop {
        let rows = fetch_catalog_page(&pool, prefix, after_id, 10)
            .await
            .expect("page fetch");
        if rows.is_empty() {
            break;
        }
        non_empty_pages += 1;
        after_id = rows.last().unwrap().id;
        seen.extend(rows.into_iter().map(|r| r.id));
    }

    assert_eq!(non_empty_pages, 3, "ceil(25/10) non-empty pages");
    assert_eq!(seen, expected, "every row once, in ascending id order");
}

#[tokio::test]
async fn rows_without_sku_are_filtered_from_snapshots() {
    let Some(pool) = test_pool().await else { return };
    let prefix = "nstest_sku_";
    reset_schema(&pool, prefix, true).await;

    insert_product(&pool, prefix, "draft", "HAS-SKU").await;
    let id = sqlx::query(&format!(
        "INSERT INTO {prefix}posts (post_status, post_type) VALUES ('draft', 'product')"
    ))
    .execute(&pool)
    .await
    .expect("insert post")
    .last_insert_id();
    set_meta(&pool, prefix, id, "_sku", "   ").await;

    let rows = fetch_catalog_page(&pool, prefix, 0, 10).await.expect("page");
    assert_eq!(rows.len(), 2, "the cursor still advances over both rows");
    let snapshots = to_snapshots(rows);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].sku, "HAS-SKU");
}

#[tokio::test]
async fn applied_chunk_rewrites_meta_lookup_and_status() {
    let Some(pool) = test_pool().await else { return };
    let prefix = "nstest_apply_";
    reset_schema(&pool, prefix, true).await;

    let id = insert_product(&pool, prefix, "draft", "SKU-APPLY").await;
    set_meta(&pool, prefix, id, "_stock", "1").await;
    set_meta(&pool, prefix, id, "_sale_price", "99").await;
    set_meta(&pool, prefix, id, "_custom_note", "untouched").await;

    let applier = BatchApplier::new(pool.clone(), prefix, 250, 4);
    let totals = applier
        .apply_chunks(vec![vec![publish_directive(id)]])
        .await;

    assert_eq!(totals.updated, 1);
    assert_eq!(totals.failed, 0);
    assert_eq!(totals.published, 1);

    assert_eq!(post_status(&pool, prefix, id).await, "publish");
    assert_eq!(meta_value(&pool, prefix, id, "_manage_stock").await.as_deref(), Some("yes"));
    assert_eq!(meta_value(&pool, prefix, id, "_stock").await.as_deref(), Some("10"));
    assert_eq!(meta_value(&pool, prefix, id, "_stock_status").await.as_deref(), Some("instock"));
    assert_eq!(meta_value(&pool, prefix, id, "_price").await.as_deref(), Some("80"));
    assert_eq!(meta_value(&pool, prefix, id, "_regular_price").await.as_deref(), Some("100"));
    assert_eq!(meta_value(&pool, prefix, id, "_sale_price").await.as_deref(), Some("80"));
    assert_eq!(
        meta_value(&pool, prefix, id, "_custom_note").await.as_deref(),
        Some("untouched"),
        "unrelated metadata is never touched"
    );

    let (stock, status, onsale): (i64, String, bool) = sqlx::query_as(&format!(
        "SELECT stock_quantity, stock_status, onsale FROM {prefix}wc_product_meta_lookup \
         WHERE product_id = ?"
    ))
    .bind(id)
    .fetch_one(&pool)
    .await
    .expect("lookup row");
    assert_eq!(stock, 10);
    assert_eq!(status, "instock");
    assert!(onsale);
}

#[tokio::test]
async fn failed_chunk_commits_nothing_and_counts_all_directives() {
    let Some(pool) = test_pool().await else { return };
    let prefix = "nstest_atomic_";
    // No lookup table: the chunk's final flush fails with a non-retriable
    // error after the per-directive writes succeeded.
    reset_schema(&pool, prefix, false).await;

    let first = insert_product(&pool, prefix, "draft", "SKU-A").await;
    let second = insert_product(&pool, prefix, "draft", "SKU-B").await;

    let applier = BatchApplier::new(pool.clone(), prefix, 250, 4);
    let totals = applier
        .apply_chunks(vec![vec![publish_directive(first), publish_directive(second)]])
        .await;

    assert_eq!(totals.updated, 0);
    assert_eq!(totals.failed, 2, "every directive in the chunk fails");
    assert_eq!(post_status(&pool, prefix, first).await, "draft");
    assert_eq!(post_status(&pool, prefix, second).await, "draft");
    assert_eq!(
        meta_value(&pool, prefix, first, "_stock").await,
        None,
        "no partial meta writes are observable"
    );
}

#[tokio::test]
async fn cache_invalidation_deletes_only_catalog_transients() {
    let Some(pool) = test_pool().await else { return };
    let prefix = "nstest_cache_";
    reset_schema(&pool, prefix, true).await;

    for (name, value) in [
        ("_transient_wc_products_onsale", "a:0:{}"),
        ("_transient_timeout_wc_products_onsale", "1700000000"),
        ("_transient_other_plugin", "keep"),
        ("siteurl", "https://shop.example.com"),
    ] {
        sqlx::query(&format!(
            "INSERT INTO {prefix}options (option_name, option_value) VALUES (?, ?)"
        ))
        .bind(name)
        .bind(value)
        .execute(&pool)
        .await
        .expect("insert option");
    }

    let deleted = invalidate_catalog_transients(&pool, prefix)
        .await
        .expect("invalidate");
    assert_eq!(deleted, 2);

    let remaining: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {prefix}options"))
            .fetch_one(&pool)
            .await
            .expect("count options");
    assert_eq!(remaining, 2);
}

#[tokio::test]
async fn sync_run_lifecycle_running_to_completed() {
    let Some(pool) = test_pool().await else { return };
    novasync_db::run_migrations(&pool).await.expect("migrate");

    let run = create_sync_run(&pool).await.expect("create run");
    assert_eq!(run.status, "running");
    assert!(run.completed_at.is_none());

    let totals = RunTotals {
        total: 10,
        successful: 9,
        failed: 1,
        published: 4,
        drafted: 2,
        duration_ms: 1234,
    };
    let details = serde_json::json!({"fetch_ms": 100, "reconcile_ms": 900});
    complete_sync_run(&pool, run.id, totals, &details)
        .await
        .expect("complete run");

    let finished = get_sync_run(&pool, run.id).await.expect("get run");
    assert_eq!(finished.status, "completed");
    assert_eq!(finished.total, 10);
    assert_eq!(finished.successful, 9);
    assert_eq!(finished.failed, 1);
    assert_eq!(finished.published_count, 4);
    assert!(finished.completed_at.is_some());
    assert!(finished.details.is_some());

    // A second terminal transition is rejected.
    let again = complete_sync_run(&pool, run.id, totals, &details).await;
    assert!(matches!(
        again,
        Err(DbError::InvalidSyncRunTransition { .. })
    ));
}
