//! Sync service contract.

use async_trait::async_trait;

use odkservices_common::{AppName, Result};

use crate::status::{SyncAttachmentState, SyncOverallResult, SyncProgressEvent, SyncStatus};

/// Interface of the out-of-process sync service.
///
/// The service serializes sync requests per app name; callers take no lock.
/// Any call may fail with `Error::ServiceDisconnected` when it races a
/// disconnect, which callers treat as "try again later".
#[async_trait]
pub trait SyncServiceInterface: Send + Sync {
    /// Current status of the last or active sync for `app`.
    async fn get_sync_status(&self, app: &AppName) -> Result<SyncStatus>;

    /// Current progress of the last or active sync for `app`.
    async fn get_sync_progress_event(&self, app: &AppName) -> Result<SyncProgressEvent>;

    /// Final result of the last finished sync for `app`.
    async fn get_sync_result(&self, app: &AppName) -> Result<SyncOverallResult>;

    /// Start verifying the configured server settings.
    ///
    /// Fire-and-forget; the outcome is observed by polling.
    async fn verify_server_settings(&self, app: &AppName) -> Result<()>;

    /// Start a full synchronization pass.
    ///
    /// Fire-and-forget; the outcome is observed by polling.
    async fn synchronize_with_server(
        &self,
        app: &AppName,
        attachment_state: SyncAttachmentState,
    ) -> Result<()>;

    /// Drop the app synchronizer once its outcome has been consumed.
    ///
    /// Returns `false` if the synchronizer could not be removed, e.g. because
    /// a sync is still running.
    async fn clear_app_synchronizer(&self, app: &AppName) -> Result<bool>;
}
