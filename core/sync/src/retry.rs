//! Bounded retry policy for calls that race the sync service binding.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use odkservices_common::{Error, Result};

/// Backoff applied while the sync service is unbound or disconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
    /// Spread each delay by +/- 25%.
    pub jitter: bool,
}

impl RetryConfig {
    /// Backoff starting at the 100ms bind delay, growing by 1.5 up to 5s.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 1.5,
            jitter: true,
        }
    }

    /// Fixed-interval policy: every retry waits exactly `delay`.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let cap = self.max_delay.as_millis() as f64;
        let grown = (0..retry).fold(
            (self.initial_delay.as_millis() as f64).min(cap),
            |delay, _| (delay * self.backoff_multiplier).min(cap),
        );
        let millis = if self.jitter {
            grown * (0.75 + rand::random::<f64>() * 0.5)
        } else {
            grown
        };
        Duration::from_millis(millis.max(0.0) as u64)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(40)
    }
}

/// Runs service calls, retrying while the service is transiently unreachable.
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    ///
    /// Only transient errors (disconnects, I/O) are retried. An exhausted
    /// budget is reported as [`Error::ServiceUnavailable`].
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => err,
                Err(err) => return Err(err),
            };

            if retries == self.config.max_retries {
                warn!("Service call gave up after {} retries: {}", retries, err);
                return Err(Error::ServiceUnavailable(err.to_string()));
            }
            let delay = self.config.delay_for_attempt(retries);
            retries += 1;
            debug!("Service call failed ({}), retry {} in {:?}", err, retries, delay);
            sleep(delay).await;
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
