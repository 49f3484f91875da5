//! Retry-with-reclassification for transaction chunks.
//!
//! The policy is a data-driven table (InnoDB error numbers plus message
//! patterns) rather than control flow, so tests can exercise the loop with
//! stub errors and the classification independently of a live server.

use std::future::Future;
use std::time::Duration;

/// InnoDB error numbers that indicate lock contention worth retrying:
/// 1205 = lock wait timeout, 1213 = deadlock.
const RETRIABLE_ERRNOS: &[u32] = &[1205, 1213];

/// Lowercased substrings of retriable error messages, used when the driver
/// error number is unavailable.
const RETRIABLE_PATTERNS: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "try restarting transaction",
];

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Linear backoff base: the sleep after attempt `n` is `base × n`.
    pub backoff_base_ms: u64,
    errnos: &'static [u32],
    patterns: &'static [&'static str],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 200,
            errnos: RETRIABLE_ERRNOS,
            patterns: RETRIABLE_PATTERNS,
        }
    }
}

impl RetryPolicy {
    /// Classifies an error as retriable lock contention or not.
    #[must_use]
    pub fn is_retriable(&self, error: &sqlx::Error) -> bool {
        let Some(db_error) = error.as_database_error() else {
            return false;
        };
        if let Some(mysql) = db_error.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
            if self.errnos.contains(&u32::from(mysql.number())) {
                return true;
            }
        }
        self.matches_message(db_error.message())
    }

    fn matches_message(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.patterns.iter().any(|pattern| lower.contains(pattern))
    }

    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Runs `operation` up to `policy.max_attempts` times, sleeping the linear
/// backoff between attempts. Non-retriable errors are returned immediately;
/// the caller owns rollback semantics (dropping an uncommitted transaction
/// rolls it back).
///
/// # Errors
///
/// Returns the last error once attempts are exhausted or the error is not
/// retriable.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= policy.max_attempts || !policy.is_retriable(&error) {
                    return Err(error);
                }
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "retriable transaction error, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
