//! Denormalized lookup-projection rows for fast storefront queries.
//!
//! One row per product, kept consistent with the per-field metadata it
//! projects. The whole chunk's rows flush in a single multi-row
//! `INSERT … ON DUPLICATE KEY UPDATE` keyed by product id.

use novasync_core::UpdateDirective;
use rust_decimal::Decimal;
use sqlx::{MySql, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct LookupRow {
    pub product_id: u64,
    pub stock_quantity: i64,
    pub stock_status: &'static str,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub onsale: bool,
}

impl LookupRow {
    /// Projects a directive into its lookup row. Simple products advertise
    /// a single price point, so min and max are both the effective price.
    #[must_use]
    pub fn from_directive(directive: &UpdateDirective) -> Self {
        Self {
            product_id: directive.id,
            stock_quantity: directive.stock,
            stock_status: stock_status(directive.stock),
            min_price: directive.effective_price,
            max_price: directive.effective_price,
            onsale: directive.on_sale,
        }
    }
}

/// The `_stock_status` / lookup value derived from a normalized quantity.
#[must_use]
pub fn stock_status(stock: i64) -> &'static str {
    if stock > 0 {
        "instock"
    } else {
        "outofstock"
    }
}

/// Builds the bulk upsert statement for `row_count` rows.
fn upsert_sql(prefix: &str, row_count: usize) -> String {
    let placeholders = std::iter::repeat("(?, ?, ?, ?, ?, ?)")
        .take(row_count)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {prefix}wc_product_meta_lookup \
             (product_id, stock_quantity, stock_status, min_price, max_price, onsale) \
         VALUES {placeholders} \
         ON DUPLICATE KEY UPDATE \
             stock_quantity = VALUES(stock_quantity), \
             stock_status   = VALUES(stock_status), \
             min_price      = VALUES(min_price), \
             max_price      = VALUES(max_price), \
             onsale         = VALUES(onsale)"
    )
}

/// Upserts the accumulated lookup rows inside the chunk's transaction.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the statement fails.
pub(crate) async fn upsert_lookup_rows(
    tx: &mut Transaction<'_, MySql>,
    prefix: &str,
    rows: &[LookupRow],
) -> Result<(), sqlx::Error> {
    if rows.is_empty() {
        return Ok(());
    }
    let sql = upsert_sql(prefix, rows.len());
    let mut query = sqlx::query(&sql);
    for row in rows {
        query = query
            .bind(row.product_id)
            .bind(row.stock_quantity)
            .bind(row.stock_status)
            .bind(row.min_price)
            .bind(row.max_price)
            .bind(row.onsale);
    }
    query.execute(&mut **tx).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use novasync_core::UpdateDirective;

    use super::*;

    fn directive(stock: i64) -> UpdateDirective {
        UpdateDirective {
            id: 7,
            stock,
            status: None,
            prices: None,
            effective_price: "80".parse().unwrap(),
            on_sale: true,
        }
    }

    #[test]
    fn stock_status_boundary_is_zero() {
        assert_eq!(stock_status(1), "instock");
        assert_eq!(stock_status(0), "outofstock");
        assert_eq!(stock_status(-1), "outofstock");
    }

    #[test]
    fn row_projects_directive_fields() {
        let row = LookupRow::from_directive(&directive(5));
        assert_eq!(row.product_id, 7);
        assert_eq!(row.stock_quantity, 5);
        assert_eq!(row.stock_status, "instock");
        assert_eq!(row.min_price, "80".parse().unwrap());
        assert_eq!(row.max_price, row.min_price);
        assert!(row.onsale);
    }

    #[test]
    fn upsert_sql_repeats_placeholders_per_row() {
        let sql = upsert_sql("wp_", 3);
        assert!(sql.starts_with("INSERT INTO wp_wc_product_meta_lookup"));
        assert_eq!(sql.matches("(?, ?, ?, ?, ?, ?)").count(), 3);
        assert!(sql.contains("ON DUPLICATE KEY UPDATE"));
    }

    #[test]
    fn upsert_sql_uses_the_configured_prefix() {
        let sql = upsert_sql("shop_", 1);
        assert!(sql.contains("shop_wc_product_meta_lookup"));
    }
}
