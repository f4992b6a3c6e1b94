//! Remote sync status, progress, and result types reported by the sync service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use odkservices_common::{Error, Result};

/// Outcome of the last or current sync, as reported by the sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// No earlier sync and no active sync.
    None,
    /// Active sync; see the progress event for details.
    Syncing,
    /// Socket, transport, or lower-level protocol error (e.g. 300s).
    NetworkTransportError,
    /// Authorization denied (authentication and/or access).
    AuthenticationError,
    /// The server answered with a 500.
    ServerInternalError,
    /// The server is not an ODK server; bad client configuration.
    ServerIsNotOdkServer,
    /// A 400 that was not an authorization failure.
    RequestOrProtocolError,
    /// Finished without conflicts, all row-level attachments synced.
    SyncComplete,
    /// Finished without conflicts, row-level attachments still pending.
    SyncCompletePendingAttachments,
    /// The server has no configuration for this client version.
    ServerMissingConfigFiles,
    /// The device has no configuration to push to the server.
    ServerResetFailedDeviceHasNoConfigFiles,
    /// Another device reset the app config mid-sync; sync must restart.
    ResyncBecauseConfigHasBeenResetError,
    /// One or more tables hold row conflicts or checkpoint rows.
    ConflictResolution,
    /// Error accessing or updating the local database.
    DeviceError,
    /// The server is not configured for this app name.
    AppnameNotSupportedByServer,
}

impl SyncStatus {
    /// Every status the sync service can report.
    pub const ALL: [SyncStatus; 15] = [
        SyncStatus::None,
        SyncStatus::Syncing,
        SyncStatus::NetworkTransportError,
        SyncStatus::AuthenticationError,
        SyncStatus::ServerInternalError,
        SyncStatus::ServerIsNotOdkServer,
        SyncStatus::RequestOrProtocolError,
        SyncStatus::SyncComplete,
        SyncStatus::SyncCompletePendingAttachments,
        SyncStatus::ServerMissingConfigFiles,
        SyncStatus::ServerResetFailedDeviceHasNoConfigFiles,
        SyncStatus::ResyncBecauseConfigHasBeenResetError,
        SyncStatus::ConflictResolution,
        SyncStatus::DeviceError,
        SyncStatus::AppnameNotSupportedByServer,
    ];

    /// Wire name of the status.
    pub fn name(&self) -> &'static str {
        match self {
            SyncStatus::None => "NONE",
            SyncStatus::Syncing => "SYNCING",
            SyncStatus::NetworkTransportError => "NETWORK_TRANSPORT_ERROR",
            SyncStatus::AuthenticationError => "AUTHENTICATION_ERROR",
            SyncStatus::ServerInternalError => "SERVER_INTERNAL_ERROR",
            SyncStatus::ServerIsNotOdkServer => "SERVER_IS_NOT_ODK_SERVER",
            SyncStatus::RequestOrProtocolError => "REQUEST_OR_PROTOCOL_ERROR",
            SyncStatus::SyncComplete => "SYNC_COMPLETE",
            SyncStatus::SyncCompletePendingAttachments => "SYNC_COMPLETE_PENDING_ATTACHMENTS",
            SyncStatus::ServerMissingConfigFiles => "SERVER_MISSING_CONFIG_FILES",
            SyncStatus::ServerResetFailedDeviceHasNoConfigFiles => {
                "SERVER_RESET_FAILED_DEVICE_HAS_NO_CONFIG_FILES"
            }
            SyncStatus::ResyncBecauseConfigHasBeenResetError => {
                "RESYNC_BECAUSE_CONFIG_HAS_BEEN_RESET_ERROR"
            }
            SyncStatus::ConflictResolution => "CONFLICT_RESOLUTION",
            SyncStatus::DeviceError => "DEVICE_ERROR",
            SyncStatus::AppnameNotSupportedByServer => "APPNAME_NOT_SUPPORTED_BY_SERVER",
        }
    }

    /// Whether the status warrants another monitor tick.
    pub fn keeps_monitoring(&self) -> bool {
        matches!(self, SyncStatus::Syncing | SyncStatus::None)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SyncStatus::ALL
            .into_iter()
            .find(|status| status.name() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// Phase of an in-flight sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncProgressState {
    #[default]
    Inactive,
    Starting,
    AppFiles,
    TableFiles,
    Rows,
    Finished,
}

/// Snapshot of sync progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgressEvent {
    /// Phase, if the service has reported one.
    pub progress_state: Option<SyncProgressState>,
    /// Human-readable progress message.
    pub message: String,
    /// Current step, or -1 when indeterminate.
    pub current_step: i32,
    /// Maximum step.
    pub max_step: i32,
}

impl SyncProgressEvent {
    /// Create a progress event.
    pub fn new(
        progress_state: SyncProgressState,
        message: impl Into<String>,
        current_step: i32,
        max_step: i32,
    ) -> Self {
        Self {
            progress_state: Some(progress_state),
            message: message.into(),
            current_step,
            max_step,
        }
    }

    /// The event reported before any sync has run.
    pub fn inactive() -> Self {
        Self::new(SyncProgressState::Inactive, "", -1, 0)
    }

    /// A finished event.
    pub fn finished(message: impl Into<String>) -> Self {
        Self::new(SyncProgressState::Finished, message, 100, 100)
    }

    /// Phase with an unreported state treated as inactive.
    pub fn state(&self) -> SyncProgressState {
        self.progress_state.unwrap_or_default()
    }

    /// Whether the sync this event belongs to has finished.
    pub fn is_finished(&self) -> bool {
        self.state() == SyncProgressState::Finished
    }
}

impl Default for SyncProgressEvent {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Which row-level attachments a sync pass transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncAttachmentState {
    /// Upload and download.
    #[default]
    Sync,
    /// Upload only.
    Upload,
    /// Download only.
    Download,
    /// Skip attachments.
    None,
    /// Download reduced-size variants only.
    ReducedDownload,
}

/// Final payload returned once a sync completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOverallResult {
    /// Overall status of the finished sync.
    pub status: SyncStatus,
    /// Per-table outcomes keyed by table id.
    #[serde(default)]
    pub tables: BTreeMap<String, SyncStatus>,
    /// When the sync finished.
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncOverallResult {
    /// Result of a sync that has not produced any outcome yet.
    pub fn empty() -> Self {
        Self {
            status: SyncStatus::None,
            tables: BTreeMap::new(),
            completed_at: None,
        }
    }

    /// Result finished now with `status`.
    pub fn completed(status: SyncStatus) -> Self {
        Self {
            status,
            tables: BTreeMap::new(),
            completed_at: Some(Utc::now()),
        }
    }

    /// Record the outcome for one table.
    pub fn with_table(mut self, table_id: impl Into<String>, status: SyncStatus) -> Self {
        self.tables.insert(table_id.into(), status);
        self
    }

    /// Tables whose outcome is not a completed sync.
    pub fn failed_tables(&self) -> impl Iterator<Item = (&str, SyncStatus)> {
        self.tables
            .iter()
            .filter(|(_, status)| {
                !matches!(
                    status,
                    SyncStatus::SyncComplete | SyncStatus::SyncCompletePendingAttachments
                )
            })
            .map(|(id, status)| (id.as_str(), *status))
    }
}

impl Default for SyncOverallResult {
    fn default() -> Self {
        Self::empty()
    }
}
