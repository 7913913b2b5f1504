//! Bounded exponential backoff for side-effect-free operations.
//!
//! Only errors that report themselves as retryable are retried. The whole
//! sequence, sleeps included, runs under a single deadline.
//!
//! Never wrap a non-idempotent write in [`retry`]: a blind retry of a
//! multi-statement write can apply its effects twice.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::config::RetryConfig;

/// Classifies an error as transient (worth retrying) or permanent.
pub trait Retryable {
    /// Returns true for transient conditions such as lock contention or connection loss.
    fn is_retryable(&self) -> bool;
}

/// Retry policy: attempt count, base backoff and overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Backoff before the first retry; doubled for each subsequent one.
    pub base_delay: Duration,
    /// Bound on the whole sequence including sleeps.
    pub deadline: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(attempts: u32, base_delay: Duration, deadline: Duration) -> Self {
        Self {
            attempts,
            base_delay,
            deadline,
        }
    }

    /// Backoff before retry number `attempt` (0-based): `base * 2^attempt`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        1u32.checked_shl(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Backoff plus a jitter drawn uniformly from `[0, backoff)`.
    #[must_use]
    pub fn delay_with_jitter(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        backoff.saturating_add(jitter(backoff))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.deadline_ms),
        )
    }
}

fn jitter(bound: Duration) -> Duration {
    let nanos = u64::try_from(bound.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rand::rng().random_range(0..nanos))
}

/// Failure of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed permanently or ran out of attempts.
    #[error("{0}")]
    Operation(E),

    /// The overall deadline elapsed before the operation succeeded.
    #[error("Retry deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Runs `op` until it succeeds, fails permanently, runs out of attempts, or the deadline passes.
///
/// Returns the last error once attempts are exhausted.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let attempts = policy.attempts.max(1);

    let run = async {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt + 1 >= attempts || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = policy.delay_with_jitter(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    };

    match tokio::time::timeout(policy.deadline, run).await {
        Ok(result) => result.map_err(RetryError::Operation),
        Err(_) => Err(RetryError::DeadlineExceeded(policy.deadline)),
    }
}
