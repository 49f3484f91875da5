//! Bearer-token management for the ERP API.
//!
//! The ERP issues short-lived tokens from a login endpoint whose response
//! shape varies between deployments; extraction lives in [`crate::extract`].
//! The cached token is shared and read-mostly. Refreshing happens under the
//! cache lock, so concurrent callers at expiry time serialize on one login
//! rather than stampeding the endpoint.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use serde_json::json;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::ErpError;
use crate::extract::{extract_expiry, extract_token};

/// Tokens are considered stale this many seconds before their reported
/// expiry, so in-flight requests never ride a token that lapses mid-call.
const REFRESH_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

pub struct TokenManager {
    client: Client,
    login_url: Url,
    username: String,
    password: String,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    /// Creates a manager using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::InvalidUrl`] if `auth_url` cannot be parsed.
    pub fn new(
        client: Client,
        auth_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, ErpError> {
        Self::with_clock(client, auth_url, username, password, Arc::new(SystemClock))
    }

    /// Creates a manager with an injected clock, for deterministic expiry
    /// tests.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::InvalidUrl`] if `auth_url` cannot be parsed.
    pub fn with_clock(
        client: Client,
        auth_url: &str,
        username: &str,
        password: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ErpError> {
        let raw = format!("{}/login", auth_url.trim_end_matches('/'));
        let login_url = Url::parse(&raw).map_err(|e| ErpError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            login_url,
            username: username.to_string(),
            password: password.to_string(),
            clock,
            cached: Mutex::new(None),
        })
    }

    /// Returns a valid bearer token, logging in only when the cached one is
    /// missing or inside the refresh window.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Auth`] on login failure and [`ErpError::Http`]
    /// on network failure.
    pub async fn token(&self) -> Result<String, ErpError> {
        let mut cached = self.cached.lock().await;
        let now = self.clock.now();
        if let Some(entry) = cached.as_ref() {
            if now < entry.expires_at - Duration::seconds(REFRESH_SKEW_SECS) {
                return Ok(entry.token.clone());
            }
        }
        let fresh = self.login().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Discards the cached token and logs in again. Used by callers that
    /// hit a 401 with a token the cache still considers valid.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Auth`] on login failure and [`ErpError::Http`]
    /// on network failure.
    pub async fn force_refresh(&self) -> Result<String, ErpError> {
        let mut cached = self.cached.lock().await;
        let fresh = self.login().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn login(&self) -> Result<CachedToken, ErpError> {
        tracing::debug!(url = %self.login_url, "logging in to ERP");
        let response = self
            .client
            .post(self.login_url.clone())
            .json(&json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ErpError::Auth {
                reason: format!("login returned {status}: {body}"),
            });
        }

        // Some deployments answer with a JSON object, some with a bare JSON
        // string, some with the raw token as plain text.
        let parsed: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) => serde_json::Value::String(body.trim().to_string()),
        };

        let token = extract_token(&parsed).ok_or_else(|| ErpError::Auth {
            reason: "login response carries no recognizable token field".to_string(),
        })?;
        let expires_at = extract_expiry(&parsed, self.clock.now());

        Ok(CachedToken { token, expires_at })
    }
}
