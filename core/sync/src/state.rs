//! Local verify-action state and its persistence across host teardown.

use serde::{Deserialize, Serialize};
use std::fmt;

use odkservices_common::{Error, Result};

/// What the local client believes it is doing.
///
/// This is a guess that the authoritative remote status overrides on every
/// tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyAction {
    /// Nothing requested; show an outcome if one is pending.
    #[default]
    Idle,
    /// The user asked to verify; the service call has not been issued yet.
    Verify,
    /// A verify is in flight on the service.
    MonitorVerifying,
}

impl VerifyAction {
    /// Name used when saving the action.
    pub fn name(&self) -> &'static str {
        match self {
            VerifyAction::Idle => "IDLE",
            VerifyAction::Verify => "VERIFY",
            VerifyAction::MonitorVerifying => "MONITOR_VERIFYING",
        }
    }

    /// Restore a saved action, falling back to `Idle` for unknown names.
    pub fn restore(name: &str) -> Self {
        match name {
            "VERIFY" => VerifyAction::Verify,
            "MONITOR_VERIFYING" => VerifyAction::MonitorVerifying,
            _ => VerifyAction::Idle,
        }
    }
}

impl fmt::Display for VerifyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Poller state that survives the host being torn down and recreated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerState {
    /// Current local action.
    #[serde(default)]
    pub action: VerifyAction,
    /// Whether the outcome of the last verify has already been displayed.
    #[serde(default)]
    pub outcome_shown: bool,
}

impl PollerState {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// An unrecognized action restores as `Idle`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;

        let action = value
            .get("action")
            .and_then(|a| a.as_str())
            .map(VerifyAction::restore)
            .unwrap_or_default();
        let outcome_shown = value
            .get("outcome_shown")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(Self {
            action,
            outcome_shown,
        })
    }
}
