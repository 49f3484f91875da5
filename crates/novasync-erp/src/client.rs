//! HTTP client for the two paginated ERP feed endpoints.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::error::ErpError;
use crate::token::TokenManager;

/// Maximum number of pages fetched per feed before giving up.
/// Protects against a nonsensical `total_pages` in the first response.
pub(crate) const MAX_PAGES: u32 = 500;

/// Fixed branch/warehouse/company selectors appended to every feed page
/// request.
#[derive(Debug, Clone)]
pub struct FeedSelectors {
    pub sucursal: String,
    pub bodega: String,
    pub empresa: Option<String>,
}

/// The two feeds consumed per reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Items,
    Prices,
}

impl Feed {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Prices => "prices",
        }
    }

    /// Feed-specific key the record array may live under when the response
    /// is neither a bare array nor a `data` envelope.
    pub(crate) fn record_key(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Prices => "precios",
        }
    }
}

/// Bearer-authenticated client over the ERP item and price-list feeds.
///
/// Holds the [`TokenManager`]; a 401 on any page request forces exactly one
/// re-login and retry before failing the run.
pub struct ErpClient {
    client: Client,
    token: TokenManager,
    items_url: Url,
    prices_url: Url,
    selectors: FeedSelectors,
}

impl ErpClient {
    /// Creates a client with configured timeouts and credentials. Base URLs
    /// are explicit so tests can point at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ErpError::InvalidUrl`] for unparseable
    /// endpoint URLs.
    pub fn new(
        timeout_secs: u64,
        auth_url: &str,
        items_url: &str,
        prices_url: &str,
        username: &str,
        password: &str,
        selectors: FeedSelectors,
    ) -> Result<Self, ErpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("novasync/0.1 (catalog-sync)")
            .build()?;
        let token = TokenManager::new(client.clone(), auth_url, username, password)?;
        Ok(Self {
            client,
            token,
            items_url: parse_url(items_url)?,
            prices_url: parse_url(prices_url)?,
            selectors,
        })
    }

    /// Warms the token cache, failing fast on bad credentials before any
    /// feed work starts.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Auth`] on login failure.
    pub async fn authenticate(&self) -> Result<(), ErpError> {
        self.token.token().await.map(|_| ())
    }

    /// Fetches one feed page, transparently re-logging in once on a 401.
    ///
    /// # Errors
    ///
    /// - [`ErpError::Auth`] — still unauthorized after the forced re-login.
    /// - [`ErpError::UnexpectedStatus`] — any other non-2xx status, with
    ///   the response body included.
    /// - [`ErpError::Http`] — network failure.
    /// - [`ErpError::Deserialize`] — response body is not valid JSON.
    pub(crate) async fn fetch_page(&self, feed: Feed, page: u32) -> Result<Value, ErpError> {
        let url = self.page_url(feed, page);
        let token = self.token.token().await?;
        let mut response = self
            .client
            .get(url.clone())
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(feed = feed.name(), page, "feed returned 401, forcing re-login");
            let token = self.token.force_refresh().await?;
            response = self
                .client
                .get(url.clone())
                .bearer_auth(&token)
                .send()
                .await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(ErpError::Auth {
                    reason: format!("{url} still unauthorized after re-login"),
                });
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErpError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ErpError::Deserialize {
            context: format!("{} feed page {page}", feed.name()),
            source: e,
        })
    }

    pub(crate) fn feed_url(&self, feed: Feed) -> &Url {
        match feed {
            Feed::Items => &self.items_url,
            Feed::Prices => &self.prices_url,
        }
    }

    /// Builds the page request URL with the incrementing `page` parameter
    /// and the fixed selectors.
    fn page_url(&self, feed: Feed, page: u32) -> Url {
        let mut url = self.feed_url(feed).clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            pairs.append_pair("sucursal", &self.selectors.sucursal);
            pairs.append_pair("bodega", &self.selectors.bodega);
            if let Some(empresa) = &self.selectors.empresa {
                pairs.append_pair("empresa", empresa);
            }
        }
        url
    }
}

fn parse_url(raw: &str) -> Result<Url, ErpError> {
    Url::parse(raw).map_err(|e| ErpError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ErpClient {
        ErpClient::new(
            30,
            "https://erp.example.com/auth",
            "https://erp.example.com/api/items",
            "https://erp.example.com/api/prices",
            "user",
            "pass",
            FeedSelectors {
                sucursal: "01".to_string(),
                bodega: "001".to_string(),
                empresa: None,
            },
        )
        .expect("client construction should not fail")
    }

    #[test]
    fn page_url_carries_page_and_selectors() {
        let client = test_client();
        let url = client.page_url(Feed::Items, 3);
        assert_eq!(
            url.as_str(),
            "https://erp.example.com/api/items?page=3&sucursal=01&bodega=001"
        );
    }

    #[test]
    fn page_url_includes_empresa_when_configured() {
        let mut client = test_client();
        client.selectors.empresa = Some("02".to_string());
        let url = client.page_url(Feed::Prices, 1);
        assert_eq!(
            url.as_str(),
            "https://erp.example.com/api/prices?page=1&sucursal=01&bodega=001&empresa=02"
        );
    }

    #[test]
    fn invalid_feed_url_is_rejected() {
        let result = ErpClient::new(
            30,
            "https://erp.example.com/auth",
            "not a url",
            "https://erp.example.com/api/prices",
            "user",
            "pass",
            FeedSelectors {
                sucursal: "01".to_string(),
                bodega: "001".to_string(),
                empresa: None,
            },
        );
        assert!(matches!(result, Err(ErpError::InvalidUrl { .. })));
    }
}
