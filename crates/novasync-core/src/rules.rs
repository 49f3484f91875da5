//! Stock, status, and price business rules.
//!
//! All functions here are pure; the diff engine composes them per row.

use rust_decimal::Decimal;

use crate::product::{PriceUpdate, ProductStatus};

/// Stock level strictly above which a product may be published.
///
/// Fixed by business rule, deliberately not configurable.
pub const STOCK_THRESHOLD: i64 = 3;

/// Normalizes a raw feed stock value to a non-negative integer.
///
/// Non-finite values (NaN, ±inf) and negatives map to 0; everything else
/// is floored.
#[must_use]
pub fn normalize_stock(raw: f64) -> i64 {
    if !raw.is_finite() || raw < 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let floored = raw.floor() as i64;
    floored
}

/// Desired publish state for a row given its normalized stock and whether
/// it has a product image.
///
/// A missing image forces `draft` regardless of stock; otherwise stock must
/// be strictly above [`STOCK_THRESHOLD`] to publish.
#[must_use]
pub fn desired_status(stock: i64, has_image: bool) -> ProductStatus {
    if has_image && stock > STOCK_THRESHOLD {
        ProductStatus::Publish
    } else {
        ProductStatus::Draft
    }
}

/// Resolves the previous/current price pair from the canonical record into
/// a concrete price write, or `None` when neither price is positive (the
/// row's existing prices are retained).
///
/// With both prices positive, the previous (list) price becomes the regular
/// price and the current price becomes the sale price only when it actually
/// undercuts it; a current price at or above the list price clears any
/// existing sale.
#[must_use]
pub fn resolve_prices(previous: Decimal, current: Decimal) -> Option<PriceUpdate> {
    let prev = previous > Decimal::ZERO;
    let cur = current > Decimal::ZERO;
    match (prev, cur) {
        (true, true) => Some(PriceUpdate {
            regular: previous,
            sale: (current < previous).then_some(current),
        }),
        (true, false) => Some(PriceUpdate {
            regular: previous,
            sale: None,
        }),
        (false, true) => Some(PriceUpdate {
            regular: current,
            sale: None,
        }),
        (false, false) => None,
    }
}

/// The effective list price: the sale price when present and positive,
/// else the regular price, else zero.
#[must_use]
pub fn effective_price(regular: Option<Decimal>, sale: Option<Decimal>) -> Decimal {
    sale.filter(|s| *s > Decimal::ZERO)
        .or(regular)
        .unwrap_or(Decimal::ZERO)
}

/// Whether the pair counts as "on sale": a positive sale price strictly
/// below the regular price, or unconditionally when no regular price is
/// supplied at all.
#[must_use]
pub fn is_on_sale(regular: Option<Decimal>, sale: Option<Decimal>) -> bool {
    match (regular, sale) {
        (Some(r), Some(s)) => s > Decimal::ZERO && s < r,
        (None, Some(s)) => s > Decimal::ZERO,
        (_, None) => false,
    }
}
