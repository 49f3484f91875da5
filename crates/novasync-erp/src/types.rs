//! Wire records for the two ERP feeds.
//!
//! Feed payloads are parsed tolerantly from raw JSON values: the ERP sends
//! numbers and numeric strings interchangeably, and field names vary
//! between endpoint versions (Spanish wire names with English aliases).
//! Entries without a product code are skipped by the caller.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::extract::{decimal_field, f64_field, string_field};

const CODE_FIELDS: &[&str] = &["codigo", "code"];
const DESCRIPTION_FIELDS: &[&str] = &["descripcion", "description"];
const STOCK_FIELDS: &[&str] = &["saldo", "stock"];
const COMPANY_FIELDS: &[&str] = &["empresa", "company"];
const LIST_TAG_FIELDS: &[&str] = &["cod_lis"];
const PRICE_FIELDS: &[&str] = &["precioiva"];

/// One entry of the stock/items feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub code: String,
    pub description: String,
    /// Raw stock value as sent by the feed; normalized later by the diff
    /// engine.
    pub stock: f64,
    pub company: Option<String>,
}

impl ItemRecord {
    /// Parses a feed entry, returning `None` when it carries no usable
    /// product code.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let code = string_field(value, CODE_FIELDS)?;
        Some(Self {
            code,
            description: string_field(value, DESCRIPTION_FIELDS).unwrap_or_default(),
            stock: f64_field(value, STOCK_FIELDS).unwrap_or(0.0),
            company: string_field(value, COMPANY_FIELDS),
        })
    }
}

/// One entry of the price-list feed.
///
/// `price` is `None` when the value fails to parse; the merge stage then
/// retains whatever it already had for that code and tag.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub code: String,
    pub list_tag: String,
    pub price: Option<Decimal>,
}

impl PriceRecord {
    /// Parses a feed entry, returning `None` when it carries no usable
    /// product code or no price-list discriminator.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let code = string_field(value, CODE_FIELDS)?;
        let list_tag = string_field(value, LIST_TAG_FIELDS)?;
        Some(Self {
            code,
            list_tag,
            price: decimal_field(value, PRICE_FIELDS),
        })
    }
}
