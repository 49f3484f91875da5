//! Tolerant extraction from ambiguous ERP response shapes.
//!
//! The ERP reports the same data under several possible field names
//! depending on endpoint version. Each extractor is an ordered list of
//! strategies tried in sequence; the first match wins. This keeps the
//! ambiguity explicit and testable instead of buried in control flow.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// Field names that may carry the bearer token in a login response.
const TOKEN_FIELDS: &[&str] = &["token", "accessToken", "access_token"];

/// Field names that may carry an absolute expiry timestamp.
const EXPIRES_AT_FIELDS: &[&str] = &["expires_at", "expiresAt"];

/// Field names that may carry a relative expires-in-seconds value.
const EXPIRES_IN_FIELDS: &[&str] = &["expiresIn", "expires_in"];

/// Field names that may carry the page count on the first feed response.
const TOTAL_PAGES_FIELDS: &[&str] = &["total_pages", "totalPages", "pages"];

/// Token validity assumed when the login response carries no expiry at all.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Extracts the bearer token from a login response body.
///
/// Strategies, in order: one of the known token fields on a JSON object,
/// then a bare JSON string body.
#[must_use]
pub fn extract_token(body: &Value) -> Option<String> {
    if let Some(object) = body.as_object() {
        for field in TOKEN_FIELDS {
            if let Some(token) = object.get(*field).and_then(Value::as_str) {
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
        return None;
    }
    body.as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extracts the token expiry instant from a login response body.
///
/// Strategies, in order: an absolute `expires_at` timestamp (epoch seconds
/// or RFC 3339), a relative `expiresIn`/`expires_in` seconds value, else
/// `now + 1h`.
#[must_use]
pub fn extract_expiry(body: &Value, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(object) = body.as_object() {
        for field in EXPIRES_AT_FIELDS {
            if let Some(at) = object.get(*field).and_then(parse_timestamp) {
                return at;
            }
        }
        for field in EXPIRES_IN_FIELDS {
            if let Some(secs) = object.get(*field).and_then(parse_seconds) {
                return now + chrono::Duration::seconds(secs);
            }
        }
    }
    now + chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS)
}

/// Extracts the record array from a feed page response, consuming it.
///
/// Strategies, in order: a bare array body, the `data` key, the
/// feed-specific key.
#[must_use]
pub fn extract_records(body: Value, feed_key: &str) -> Option<Vec<Value>> {
    match body {
        Value::Array(records) => Some(records),
        Value::Object(mut object) => {
            for key in ["data", feed_key] {
                if let Some(Value::Array(records)) = object.remove(key) {
                    return Some(records);
                }
            }
            None
        }
        _ => None,
    }
}

/// Extracts the total page count reported by the first feed response.
///
/// A single page is assumed unless the response says otherwise; zero and
/// unparseable values also collapse to 1.
#[must_use]
pub fn extract_total_pages(body: &Value) -> u32 {
    let Some(object) = body.as_object() else {
        return 1;
    };
    for field in TOTAL_PAGES_FIELDS {
        if let Some(pages) = object.get(*field).and_then(parse_seconds) {
            if let Ok(pages) = u32::try_from(pages) {
                return pages.max(1);
            }
        }
    }
    1
}

/// Reads the first present field as a trimmed non-empty string. Numeric
/// values render through their JSON representation (item codes are
/// sometimes sent as numbers).
#[must_use]
pub fn string_field(value: &Value, fields: &[&str]) -> Option<String> {
    let object = value.as_object()?;
    for field in fields {
        match object.get(*field) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Reads the first present field as an `f64`, accepting numbers and
/// numeric strings.
#[must_use]
pub fn f64_field(value: &Value, fields: &[&str]) -> Option<f64> {
    let object = value.as_object()?;
    for field in fields {
        match object.get(*field) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.trim().parse::<f64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads the first present field as a `Decimal`, accepting numbers and
/// numeric strings. Values that fail to parse yield `None` so callers can
/// retain a prior value.
#[must_use]
pub fn decimal_field(value: &Value, fields: &[&str]) -> Option<Decimal> {
    let object = value.as_object()?;
    for field in fields {
        match object.get(*field) {
            // Going through the JSON text keeps the exact decimal digits
            // instead of routing the value through f64.
            Some(Value::Number(n)) => return n.to_string().parse().ok(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.trim().parse::<Decimal>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64()?;
            Utc.timestamp_opt(secs, 0).single()
        }
        Value::String(s) => {
            if let Ok(at) = DateTime::parse_from_rfc3339(s) {
                return Some(at.with_timezone(&Utc));
            }
            let secs = s.parse::<i64>().ok()?;
            Utc.timestamp_opt(secs, 0).single()
        }
        _ => None,
    }
}

fn parse_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
