//! Retry with exponential backoff for idempotent chain reads.
//!
//! Fetching the transaction context (chain info and the reference block) is
//! safe to repeat, so the HTTP network retries it on transient failures.
//! Pushing a transaction is never retried here: a timed-out push may still
//! have been accepted.
//!
//! # Example
//!
//! ```rust
//! use eos_write_api::retry::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig::default()
//!     .with_max_retries(5)
//!     .with_initial_delay(Duration::from_millis(100))
//!     .without_jitter();
//! assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
//! ```

use crate::error::{WriteApiError, WriteApiResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// How often and how patiently chain reads are retried.
///
/// The delay doubles with every attempt, up to `max_delay`. With jitter on,
/// each delay is moved randomly by up to half its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt; zero fails fast.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Randomize delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Fails on the first error.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Short, frequent retries for a node on the local machine.
    pub fn local() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            jitter: true,
        }
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Uses exact delays.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// The delay before retry number `attempt`, counting from one.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let doublings = attempt.saturating_sub(1).min(31);
        let delay = self
            .initial_delay
            .saturating_mul(1 << doublings)
            .min(self.max_delay);
        if self.jitter {
            // uniform in [0.5, 1.5)
            delay.mul_f64(0.5 + rand::random::<f64>())
        } else {
            delay
        }
    }
}

/// Runs `operation` until it succeeds, fails with an error that is not
/// [retryable](WriteApiError::is_retryable), or runs out of retries.
pub(crate) async fn retry_idempotent<F, Fut, T>(
    config: &RetryConfig,
    operation: F,
) -> WriteApiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = WriteApiResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < config.max_retries && error.is_retryable() => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                debug!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error.sanitized_message(),
                    "retrying chain read"
                );
                sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
