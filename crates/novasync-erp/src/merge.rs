//! Merge stage: full outer join of the item and price feeds by code.

use std::collections::HashMap;

use novasync_core::CanonicalProduct;

use crate::types::{ItemRecord, PriceRecord};

/// Price-list tags denoting the *current* selling price.
const CURRENT_PRICE_TAGS: &[&str] = &["05", "5"];

/// Price-list tag denoting the *previous* (list) price.
const PREVIOUS_PRICE_TAG: &str = "22";

/// Joins the two feeds into one canonical record per product code.
///
/// Items seed the map (stock from the feed, prices zero); price records
/// update or create the entry for their code. Within a run, later records
/// overwrite earlier ones for the same tag — feed page order is the write
/// order. Records for price lists other than the two consumed tags are
/// ignored, as are price values that failed to parse.
#[must_use]
pub fn merge(items: Vec<ItemRecord>, prices: Vec<PriceRecord>) -> HashMap<String, CanonicalProduct> {
    let mut merged: HashMap<String, CanonicalProduct> = HashMap::with_capacity(items.len());

    for item in items {
        merged.insert(
            item.code.clone(),
            CanonicalProduct::from_item(item.code, item.description, item.stock),
        );
    }

    for price in prices {
        let Some(value) = price.price else {
            // Unparseable price: the prior value (possibly the zero
            // default) is retained.
            continue;
        };
        let entry = merged
            .entry(price.code.clone())
            .or_insert_with(|| CanonicalProduct::price_only(price.code));
        if CURRENT_PRICE_TAGS.contains(&price.list_tag.as_str()) {
            entry.current_price = value;
        } else if price.list_tag == PREVIOUS_PRICE_TAG {
            entry.previous_price = value;
        }
    }

    merged
}
