//! In-memory sync service for testing and demos.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;

use odkservices_common::{AppName, Error, Result};

use crate::service::SyncServiceInterface;
use crate::status::{
    SyncAttachmentState, SyncOverallResult, SyncProgressEvent, SyncProgressState, SyncStatus,
};

/// A scripted sync run: progress frames followed by a terminal status.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    frames: Vec<SyncProgressEvent>,
    final_status: SyncStatus,
    result: Option<SyncOverallResult>,
}

impl ScriptedRun {
    /// A verify run with the usual phases ending in `final_status`.
    pub fn verify(final_status: SyncStatus) -> Self {
        Self {
            frames: vec![
                SyncProgressEvent::new(SyncProgressState::Starting, "Contacting server", 0, 3),
                SyncProgressEvent::new(SyncProgressState::AppFiles, "Checking credentials", 1, 3),
                SyncProgressEvent::new(SyncProgressState::AppFiles, "Checking app name", 2, 3),
            ],
            final_status,
            result: None,
        }
    }

    /// Replace the progress frames.
    pub fn with_frames(mut self, frames: Vec<SyncProgressEvent>) -> Self {
        self.frames = frames;
        self
    }

    /// Use an explicit result instead of one derived from the final status.
    pub fn with_result(mut self, result: SyncOverallResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Terminal status of the run.
    pub fn final_status(&self) -> SyncStatus {
        self.final_status
    }
}

#[derive(Debug)]
struct Inner {
    status: SyncStatus,
    event: SyncProgressEvent,
    result: SyncOverallResult,
    frames: VecDeque<SyncProgressEvent>,
    pending: Option<ScriptedRun>,
    planned: Option<ScriptedRun>,
    has_synchronizer: bool,
}

impl Inner {
    fn start(&mut self, run: ScriptedRun) {
        self.frames = run.frames.iter().cloned().collect();
        self.pending = Some(run);
        self.has_synchronizer = true;
    }

    /// Move the active run forward by one frame.
    fn advance(&mut self) {
        if let Some(frame) = self.frames.pop_front() {
            self.status = SyncStatus::Syncing;
            self.event = frame;
        } else if let Some(run) = self.pending.take() {
            self.status = run.final_status;
            self.event = SyncProgressEvent::finished(format!("Finished: {}", run.final_status));
            self.result = run
                .result
                .unwrap_or_else(|| SyncOverallResult::completed(run.final_status));
        }
    }

    fn is_running(&self) -> bool {
        self.pending.is_some()
    }
}

/// In-memory sync service.
///
/// Verify and synchronize requests start the planned [`ScriptedRun`] (or a
/// successful verify run when none is planned). Each status query advances
/// the run by one frame, so a poller observes `SYNCING` for every frame and
/// then the terminal status with a `FINISHED` progress event.
pub struct MemorySyncService {
    inner: Mutex<Inner>,
    disconnected: AtomicBool,
    verify_calls: AtomicU32,
    sync_calls: AtomicU32,
    status_queries: AtomicU32,
}

impl MemorySyncService {
    /// Create an idle service with no earlier sync.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                status: SyncStatus::None,
                event: SyncProgressEvent::inactive(),
                result: SyncOverallResult::empty(),
                frames: VecDeque::new(),
                pending: None,
                planned: None,
                has_synchronizer: false,
            }),
            disconnected: AtomicBool::new(false),
            verify_calls: AtomicU32::new(0),
            sync_calls: AtomicU32::new(0),
            status_queries: AtomicU32::new(0),
        }
    }

    /// Create a service whose last sync already finished with `status`.
    pub fn finished(status: SyncStatus) -> Self {
        let service = Self::new();
        service.set_state(status, SyncProgressEvent::finished("Finished"));
        service.set_result(SyncOverallResult::completed(status));
        service
    }

    /// Plan the run started by the next verify or synchronize request.
    pub fn plan_run(&self, run: ScriptedRun) {
        self.lock().planned = Some(run);
    }

    /// Overwrite the reported status and progress.
    pub fn set_state(&self, status: SyncStatus, event: SyncProgressEvent) {
        let mut inner = self.lock();
        inner.status = status;
        inner.event = event;
    }

    /// Overwrite the reported result.
    pub fn set_result(&self, result: SyncOverallResult) {
        self.lock().result = result;
    }

    /// Make every call fail as if the service had gone away.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.store(disconnected, Ordering::SeqCst);
    }

    /// Number of verify requests received.
    pub fn verify_calls(&self) -> u32 {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Number of synchronize requests received.
    pub fn sync_calls(&self) -> u32 {
        self.sync_calls.load(Ordering::SeqCst)
    }

    /// Number of status queries received.
    pub fn status_queries(&self) -> u32 {
        self.status_queries.load(Ordering::SeqCst)
    }

    /// Whether a synchronizer exists that has not been cleared.
    pub fn has_synchronizer(&self) -> bool {
        self.lock().has_synchronizer
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_connected(&self) -> Result<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(Error::ServiceDisconnected(
                "memory sync service disconnected".to_string(),
            ));
        }
        Ok(())
    }

    fn start_run(&self, app: &AppName) {
        let mut inner = self.lock();
        if inner.is_running() {
            debug!("Sync already running for {}, request ignored", app);
            return;
        }
        let run = inner
            .planned
            .take()
            .unwrap_or_else(|| ScriptedRun::verify(SyncStatus::SyncComplete));
        debug!("Starting scripted run for {} ending in {}", app, run.final_status);
        inner.start(run);
    }
}

impl Default for MemorySyncService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncServiceInterface for MemorySyncService {
    async fn get_sync_status(&self, _app: &AppName) -> Result<SyncStatus> {
        self.check_connected()?;
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        inner.advance();
        Ok(inner.status)
    }

    async fn get_sync_progress_event(&self, _app: &AppName) -> Result<SyncProgressEvent> {
        self.check_connected()?;
        Ok(self.lock().event.clone())
    }

    async fn get_sync_result(&self, _app: &AppName) -> Result<SyncOverallResult> {
        self.check_connected()?;
        Ok(self.lock().result.clone())
    }

    async fn verify_server_settings(&self, app: &AppName) -> Result<()> {
        self.check_connected()?;
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.start_run(app);
        Ok(())
    }

    async fn synchronize_with_server(
        &self,
        app: &AppName,
        attachment_state: SyncAttachmentState,
    ) -> Result<()> {
        self.check_connected()?;
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        debug!("Synchronize requested for {} ({:?})", app, attachment_state);
        self.start_run(app);
        Ok(())
    }

    async fn clear_app_synchronizer(&self, _app: &AppName) -> Result<bool> {
        self.check_connected()?;
        let mut inner = self.lock();
        if inner.is_running() {
            return Ok(false);
        }
        inner.has_synchronizer = false;
        inner.status = SyncStatus::None;
        inner.event = SyncProgressEvent::inactive();
        inner.result = SyncOverallResult::empty();
        Ok(true)
    }
}
