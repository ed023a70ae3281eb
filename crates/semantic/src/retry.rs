//! Retry with exponential backoff for transient encoder failures.
//!
//! Only errors for which [`SemanticError::is_transient`] holds are retried.
//! Everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::SemanticError;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call.
    pub max_retries: u32,
    /// Base delay between retries (doubled on every attempt).
    #[serde(with = "crate::serde_millis")]
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    #[serde(with = "crate::serde_millis")]
    pub max_delay: Duration,
    /// Whether to add 0-50% random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or
/// runs out of retries. The closure receives the zero-based attempt number.
pub async fn retry_transient<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, SemanticError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SemanticError>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "encoder_request_retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Delay before retry number `attempt + 1`.
fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config.base_delay.as_millis() as u64;
    let exponential = base.saturating_mul(2_u64.saturating_pow(attempt));
    let delay = exponential.min(config.max_delay.as_millis() as u64);

    if config.jitter {
        let jitter = fastrand::u64(0..=delay / 2);
        Duration::from_millis(delay + jitter)
    } else {
        Duration::from_millis(delay)
    }
}
