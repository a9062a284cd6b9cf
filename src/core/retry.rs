//! Fixed-delay retry for outbound Bot API calls
//!
//! Each failed attempt is followed by a constant pause; `Retryable` decides
//! per error whether another attempt is worth it.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::core::config;
use crate::core::metrics;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts")]
    MaxRetriesExhausted { attempts: u32, last_error: E },
}

/// How many extra attempts to make and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryConfig {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// sendMessage policy: 2 extra attempts, 1 second apart
    pub fn send_message() -> Self {
        Self::fixed(config::retry::SEND_MAX_RETRIES, config::retry::send_delay())
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::send_message()
    }
}

#[derive(Debug)]
pub struct RetryResult<T, E> {
    pub result: Result<T, RetryError<E>>,
    pub attempts: u32,
}

impl<T, E> RetryResult<T, E> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn is_exhausted(&self) -> bool {
        self.result.is_err()
    }
}

pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Wrapper that retries on every error, including Bot API rejections
#[derive(Debug)]
pub struct AlwaysRetryable<E>(pub E);

impl<E> Retryable for AlwaysRetryable<E> {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Runs `operation` until it succeeds, the error is not retryable, or the
/// attempts run out
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Debug,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error = match operation().await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts,
                }
            }
            Err(e) => e,
        };

        if attempts > config.max_retries || !error.is_retryable() {
            return RetryResult {
                result: Err(RetryError::MaxRetriesExhausted {
                    attempts,
                    last_error: error,
                }),
                attempts,
            };
        }

        log::warn!(
            "Attempt {}/{} failed, retrying in {:?}: {:?}",
            attempts,
            config.max_attempts(),
            config.delay,
            error
        );
        metrics::RETRIES_TOTAL.inc();
        tokio::time::sleep(config.delay).await;
    }
}
