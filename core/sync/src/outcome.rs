//! User-facing outcome text for a finished verify.

use serde::Serialize;

use crate::status::SyncStatus;

/// Title and message shown when a verify finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub title: &'static str,
    pub message: &'static str,
}

const COMMUNICATIONS_ERROR: &str = "Communications Error";
const DEVICE_INTERNAL_ERROR: &str = "Device Internal Error";

/// Map a remote status to the outcome shown to the user.
///
/// Statuses that never end a verify normally (`NONE`, `SYNCING`, the
/// sync-only outcomes) collapse into the device-internal-error outcome.
pub fn render_outcome(status: SyncStatus) -> Outcome {
    let (title, message) = match status {
        SyncStatus::NetworkTransportError => (
            COMMUNICATIONS_ERROR,
            "The server could not be reached. Check the network connection and the server URL.",
        ),
        SyncStatus::AuthenticationError => (
            "User Authorization Failure",
            "The server rejected the username or password, or the user lacks access.",
        ),
        SyncStatus::ServerInternalError => (
            COMMUNICATIONS_ERROR,
            "The server reported an internal error. Try again later.",
        ),
        SyncStatus::ServerIsNotOdkServer => (
            "Device Configuration Failure",
            "The server URL does not point at an ODK sync server, or a gateway is in the way.",
        ),
        SyncStatus::RequestOrProtocolError => (
            COMMUNICATIONS_ERROR,
            "The server rejected the request. The client and server may be incompatible.",
        ),
        SyncStatus::None
        | SyncStatus::Syncing
        | SyncStatus::SyncCompletePendingAttachments
        | SyncStatus::ServerMissingConfigFiles
        | SyncStatus::ServerResetFailedDeviceHasNoConfigFiles
        | SyncStatus::ResyncBecauseConfigHasBeenResetError
        | SyncStatus::ConflictResolution
        | SyncStatus::DeviceError => (
            DEVICE_INTERNAL_ERROR,
            "An unexpected error occurred on the device while verifying the server settings.",
        ),
        SyncStatus::AppnameNotSupportedByServer => (
            "Server Configuration Failure",
            "The server is not configured for this application. Contact the site administrator.",
        ),
        SyncStatus::SyncComplete => (
            "Verify Server Settings Successful",
            "The server settings are valid and the server accepted the credentials.",
        ),
    };

    Outcome { title, message }
}
