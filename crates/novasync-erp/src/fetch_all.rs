//! Multi-page fetch loops for [`ErpClient`].

use serde_json::Value;

use crate::client::{ErpClient, Feed, MAX_PAGES};
use crate::error::ErpError;
use crate::extract::{extract_records, extract_total_pages};
use crate::types::{ItemRecord, PriceRecord};

impl ErpClient {
    /// Fetches every page of a feed and returns the raw records
    /// concatenated in page order.
    ///
    /// The first response's reported page count bounds the loop (a single
    /// page is assumed when absent), so a feed of N pages issues exactly N
    /// requests. Any page failure aborts the whole fetch — a partial
    /// dataset would merge into an incorrect canonical snapshot.
    ///
    /// # Errors
    ///
    /// Propagates any error from the page fetch; returns
    /// [`ErpError::MalformedPage`] when a page carries no recognizable
    /// record array, and [`ErpError::PaginationLimit`] if the reported
    /// page count exceeds [`MAX_PAGES`].
    pub async fn fetch_all(&self, feed: Feed) -> Result<Vec<Value>, ErpError> {
        let mut records: Vec<Value> = Vec::new();
        let mut total_pages = 1u32;
        let mut page = 1u32;

        loop {
            if page > MAX_PAGES {
                return Err(ErpError::PaginationLimit {
                    feed: feed.name(),
                    max_pages: MAX_PAGES,
                });
            }

            let body = self.fetch_page(feed, page).await?;
            if page == 1 {
                total_pages = extract_total_pages(&body);
            }

            let page_records =
                extract_records(body, feed.record_key()).ok_or_else(|| ErpError::MalformedPage {
                    url: self.feed_url(feed).to_string(),
                })?;
            records.extend(page_records);

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::info!(
            feed = feed.name(),
            pages = total_pages,
            records = records.len(),
            "feed fetch complete"
        );
        Ok(records)
    }

    /// Fetches and parses the full items feed, skipping entries without a
    /// product code.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_all`].
    pub async fn fetch_items(&self) -> Result<Vec<ItemRecord>, ErpError> {
        let raw = self.fetch_all(Feed::Items).await?;
        Ok(parse_records(&raw, "items", ItemRecord::from_value))
    }

    /// Fetches and parses the full price-list feed, skipping entries
    /// without a code or list discriminator.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_all`].
    pub async fn fetch_prices(&self) -> Result<Vec<PriceRecord>, ErpError> {
        let raw = self.fetch_all(Feed::Prices).await?;
        Ok(parse_records(&raw, "prices", PriceRecord::from_value))
    }
}

fn parse_records<T>(raw: &[Value], feed: &'static str, parse: fn(&Value) -> Option<T>) -> Vec<T> {
    let mut skipped = 0usize;
    let parsed: Vec<T> = raw
        .iter()
        .filter_map(|value| {
            let record = parse(value);
            if record.is_none() {
                skipped += 1;
            }
            record
        })
        .collect();
    if skipped > 0 {
        tracing::warn!(feed, skipped, "skipped malformed feed entries");
    }
    parsed
}
