//! Poller configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use odkservices_common::{AppName, Error, Result, ServerSettings};

use crate::retry::RetryConfig;

/// Configuration for the sync status poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Application whose sync status is polled.
    #[serde(default)]
    pub app_name: AppName,
    /// Server the verify runs against.
    #[serde(default)]
    pub server: ServerSettings,
    /// Delay between monitor ticks while a verify is in flight.
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval: Duration,
    /// How long to keep monitoring before the service reports the verify as
    /// started. Zero gives up on the first monitor tick.
    #[serde(default = "default_pickup_timeout")]
    pub pickup_timeout: Duration,
    /// Backoff while the sync service is unbound.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_monitor_interval() -> Duration {
    Duration::from_millis(150)
}

fn default_pickup_timeout() -> Duration {
    Duration::from_secs(5)
}

impl PollerConfig {
    /// Create a configuration for `app_name` against `server`.
    pub fn new(app_name: AppName, server: ServerSettings) -> Self {
        Self {
            app_name,
            server,
            monitor_interval: default_monitor_interval(),
            pickup_timeout: default_pickup_timeout(),
            retry: RetryConfig::default(),
        }
    }

    /// Set the monitor interval.
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    /// Set the pickup timeout.
    pub fn with_pickup_timeout(mut self, timeout: Duration) -> Self {
        self.pickup_timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new(AppName::default(), ServerSettings::default())
    }
}
