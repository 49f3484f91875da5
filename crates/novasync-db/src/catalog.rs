//! Cursor reader over the catalog's product rows.
//!
//! Pages are keyset-paginated on the immutable primary key (`ID > ?`,
//! ascending, fixed limit) so a full scan is bounded-memory and never
//! revisits a row. Rows inserted behind an already-passed cursor position
//! are missed within a run; the next scheduled run picks them up.

use novasync_core::{ProductSnapshot, ProductStatus};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::DbError;

/// One raw product row with its reconciliation-relevant meta values,
/// still in wire form (meta values are strings).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: u64,
    pub post_status: String,
    pub sku: Option<String>,
    pub thumbnail_id: Option<String>,
    pub stock: Option<String>,
    pub regular_price: Option<String>,
    pub sale_price: Option<String>,
}

impl CatalogRow {
    /// Converts the raw row into a typed snapshot, or `None` when the row
    /// has no usable SKU and is therefore excluded from reconciliation.
    #[must_use]
    pub fn into_snapshot(self) -> Option<ProductSnapshot> {
        let sku = self.sku.as_deref().map(str::trim).unwrap_or_default();
        if sku.is_empty() {
            return None;
        }
        Some(ProductSnapshot {
            id: self.id,
            status: ProductStatus::parse(&self.post_status),
            sku: sku.to_string(),
            has_image: self
                .thumbnail_id
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty() && t.trim() != "0"),
            stock: parse_stock(self.stock.as_deref()),
            regular_price: parse_price(self.regular_price.as_deref()),
            sale_price: parse_price(self.sale_price.as_deref()),
        })
    }
}

/// Builds the page query for a given table prefix.
fn page_query(prefix: &str) -> String {
    format!(
        "SELECT p.ID AS id, p.post_status, \
                sku.meta_value AS sku, \
                thumb.meta_value AS thumbnail_id, \
                stock.meta_value AS stock, \
                rp.meta_value AS regular_price, \
                sp.meta_value AS sale_price \
         FROM {prefix}posts p \
         LEFT JOIN {prefix}postmeta sku ON sku.post_id = p.ID AND sku.meta_key = '_sku' \
         LEFT JOIN {prefix}postmeta thumb ON thumb.post_id = p.ID AND thumb.meta_key = '_thumbnail_id' \
         LEFT JOIN {prefix}postmeta stock ON stock.post_id = p.ID AND stock.meta_key = '_stock' \
         LEFT JOIN {prefix}postmeta rp ON rp.post_id = p.ID AND rp.meta_key = '_regular_price' \
         LEFT JOIN {prefix}postmeta sp ON sp.post_id = p.ID AND sp.meta_key = '_sale_price' \
         WHERE p.post_type = 'product' AND p.ID > ? \
         ORDER BY p.ID ASC \
         LIMIT ?"
    )
}

/// Fetches the next page of product rows after `after_id`, ordered by id
/// ascending. An empty result means the scan is exhausted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_catalog_page(
    pool: &MySqlPool,
    prefix: &str,
    after_id: u64,
    page_size: u32,
) -> Result<Vec<CatalogRow>, DbError> {
    let rows = sqlx::query_as::<_, CatalogRow>(&page_query(prefix))
        .bind(after_id)
        .bind(page_size)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Converts a page of raw rows into snapshots, dropping rows without a
/// usable SKU.
#[must_use]
pub fn to_snapshots(rows: Vec<CatalogRow>) -> Vec<ProductSnapshot> {
    rows.into_iter()
        .filter_map(CatalogRow::into_snapshot)
        .collect()
}

fn parse_stock(raw: Option<&str>) -> Option<i64> {
    let parsed = raw?.trim().parse::<f64>().ok()?;
    Some(novasync_core::rules::normalize_stock(parsed))
}

fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    raw?.trim().parse::<Decimal>().ok()
}
