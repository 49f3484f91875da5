//! Shared value types exchanged between the ERP feed side and the catalog
//! store side of a reconciliation run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Merged item+price record keyed by product code — the unit of truth for
/// one reconciliation pass.
///
/// `stock` is kept as the raw feed value; normalization (flooring, clamping
/// negatives and non-finite values to zero) happens in the diff engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub code: String,
    pub description: String,
    pub stock: f64,
    pub previous_price: Decimal,
    pub current_price: Decimal,
}

impl CanonicalProduct {
    /// Creates an entry with zeroed prices, as seeded from the item feed.
    #[must_use]
    pub fn from_item(code: String, description: String, stock: f64) -> Self {
        Self {
            code,
            description,
            stock,
            previous_price: Decimal::ZERO,
            current_price: Decimal::ZERO,
        }
    }

    /// Creates an entry for a code seen only in the price feed.
    #[must_use]
    pub fn price_only(code: String) -> Self {
        Self::from_item(code, String::new(), 0.0)
    }
}

/// A product's `post_status` in the catalog store.
///
/// Only `publish` and `draft` are managed by the engine; any other value
/// (`pending`, `private`, …) is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductStatus {
    Publish,
    Draft,
    Other(String),
}

impl ProductStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "publish" => Self::Publish,
            "draft" => Self::Draft,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Whether the engine owns this status (i.e. may rewrite it).
    #[must_use]
    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Publish | Self::Draft)
    }
}

/// Current state of one catalog row, as read by the cursor reader.
///
/// `stock` is the parsed `_stock` meta value, already normalized; `None`
/// means the meta row is missing or unparseable (always treated as a diff).
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: u64,
    pub status: ProductStatus,
    pub sku: String,
    pub has_image: bool,
    pub stock: Option<i64>,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

/// A proposed price write: the regular price is always set, the sale price
/// is either set (`Some`) or cleared (`None`). Absence of the whole struct
/// on a directive means "leave both price fields alone".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceUpdate {
    pub regular: Decimal,
    pub sale: Option<Decimal>,
}

/// The minimal set of field changes for one catalog row, produced by the
/// diff engine and consumed exactly once by the batch applier.
///
/// `effective_price` and `on_sale` are derived at diff time (from the
/// proposed prices when present, else the row's current ones) so the
/// applier can rewrite the `_price` meta and the lookup projection without
/// re-reading the row.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDirective {
    pub id: u64,
    /// Normalized stock quantity to write.
    pub stock: i64,
    /// `Some` only when the status actually changes; restricted to
    /// [`ProductStatus::Publish`] / [`ProductStatus::Draft`].
    pub status: Option<ProductStatus>,
    pub prices: Option<PriceUpdate>,
    pub effective_price: Decimal,
    pub on_sale: bool,
}
