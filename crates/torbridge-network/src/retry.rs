//! Bounded retry with a fixed delay.
//!
//! Used for link lookups right after creation, when the kernel may not have
//! published the interface yet. Delays go through `tokio::time`, so tests run
//! them on a paused clock.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempts made by the default policy.
pub const DEFAULT_ATTEMPTS: u32 = 2;

/// Pause between attempts of the default policy.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Fixed-delay retry policy. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A policy that tries once.
    #[must_use]
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Attempts actually performed. A zero policy still tries once.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// Sleeps `delay` between failed attempts, never after the last one.
    /// Returns the last error on exhaustion.
    pub async fn retry<T, E, F, Fut>(&self, description: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(description, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < attempts => {
                    tracing::debug!(
                        description,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
