//! Bounded retry with a fixed delay.
//!
//! Every network and browser call site goes through [`RetryPolicy::run`].
//! A thrown fault and an unacceptable ("empty") result are both retried;
//! after the last attempt the caller gets a [`RetryExhausted`] describing
//! the final failure and is responsible for logging it.

use esg_core::RetryConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Attempt count and fixed delay for one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least one attempt.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Policy from the `[retry]` configuration section.
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }

    /// Maximum number of attempts, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between consecutive attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it returns a value accepted by `accept`.
    ///
    /// Sleeps `delay` between attempts but not after the last one.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, accept: P) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
        E: fmt::Display,
    {
        let mut last = AttemptFailure::Empty;

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) if accept(&value) => return Ok(value),
                Ok(_) => {
                    tracing::debug!(
                        "Attempt {}/{} returned an empty result",
                        attempt,
                        self.max_attempts
                    );
                    last = AttemptFailure::Empty;
                }
                Err(e) => {
                    tracing::debug!("Attempt {}/{} failed: {}", attempt, self.max_attempts, e);
                    last = AttemptFailure::Fault(e);
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay).await;
            }
        }

        Err(RetryExhausted {
            attempts: self.max_attempts,
            last,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Accept any successful result.
pub fn accept_any<T>(_: &T) -> bool {
    true
}

/// Accept only non-empty collections.
#[allow(clippy::ptr_arg)]
pub fn accept_non_empty<T>(items: &Vec<T>) -> bool {
    !items.is_empty()
}

/// Outcome of the final attempt of an exhausted retry.
#[derive(Debug)]
pub enum AttemptFailure<E> {
    /// The operation succeeded but its result was rejected as empty
    Empty,
    /// The operation failed
    Fault(E),
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Number of attempts made
    pub attempts: u32,
    /// Failure of the last attempt
    pub last: AttemptFailure<E>,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last {
            AttemptFailure::Empty => write!(f, "empty result after {} attempts", self.attempts),
            AttemptFailure::Fault(e) => write!(f, "{} (after {} attempts)", e, self.attempts),
        }
    }
}
