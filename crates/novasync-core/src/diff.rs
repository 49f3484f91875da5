//! Per-row diff computation against the canonical dataset.
//!
//! Given the current state of one catalog row and the merged ERP records,
//! decides whether the row needs an update and produces the minimal
//! [`UpdateDirective`] when it does. Re-running over unchanged inputs
//! yields no directive — applying a directive is idempotent.

use std::collections::HashMap;

use crate::product::{
    CanonicalProduct, PriceUpdate, ProductSnapshot, ProductStatus, UpdateDirective,
};
use crate::rules::{desired_status, effective_price, is_on_sale, normalize_stock, resolve_prices};

/// Computes the update directive for one catalog row, or `None` when the
/// row already matches the canonical state.
///
/// Rows whose SKU has no canonical match are suppressed rather than
/// deleted: stock forced to 0 and status to draft (still subject to the
/// managed-status passthrough rule).
#[must_use]
pub fn diff(
    snapshot: &ProductSnapshot,
    canonical: &HashMap<String, CanonicalProduct>,
) -> Option<UpdateDirective> {
    let (stock, prices) = match canonical.get(snapshot.sku.as_str()) {
        Some(record) => {
            let stock = normalize_stock(record.stock);
            let proposal = resolve_prices(record.previous_price, record.current_price)
                .filter(|p| price_differs(snapshot, p));
            (stock, proposal)
        }
        // Absent upstream: suppress. No price proposal — existing prices stay.
        None => (0, None),
    };

    let status = proposed_status(&snapshot.status, desired_status(stock, snapshot.has_image));
    let stock_changed = snapshot.stock != Some(stock);

    if !stock_changed && status.is_none() && prices.is_none() {
        return None;
    }

    let (regular, sale) = match &prices {
        Some(p) => (Some(p.regular), p.sale),
        None => (snapshot.regular_price, snapshot.sale_price),
    };

    Some(UpdateDirective {
        id: snapshot.id,
        stock,
        status,
        prices,
        effective_price: effective_price(regular, sale),
        on_sale: is_on_sale(regular, sale),
    })
}

/// Returns the status to write, or `None` when the row's status must not
/// change: either it already matches, or it is an unmanaged value
/// (`pending`, `private`, …) that the engine passes through untouched.
fn proposed_status(current: &ProductStatus, desired: ProductStatus) -> Option<ProductStatus> {
    if current.is_managed() && *current != desired {
        Some(desired)
    } else {
        None
    }
}

fn price_differs(snapshot: &ProductSnapshot, proposal: &PriceUpdate) -> bool {
    snapshot.regular_price != Some(proposal.regular) || snapshot.sale_price != proposal.sale
}
