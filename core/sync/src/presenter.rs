//! UI-facing side of the poller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::status::{SyncProgressState, SyncStatus};

/// Receiver of progress and outcome presentations.
///
/// Calls arrive on the poller's task; implementations hand them to whatever
/// owns the display.
pub trait SyncPresenter: Send + Sync {
    /// Whether the host is alive and able to present anything.
    fn is_ready(&self) -> bool {
        true
    }

    /// Enable or disable the "verify" input.
    fn set_input_enabled(&self, enabled: bool);

    /// Show or update the progress presentation.
    fn on_progress(
        &self,
        status: SyncStatus,
        progress_state: SyncProgressState,
        message: &str,
        step: i32,
        max_step: i32,
    );

    /// Show the final outcome.
    fn on_outcome(&self, title: &str, message: &str);
}

/// A presentation captured by [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Progress {
        status: SyncStatus,
        progress_state: SyncProgressState,
        message: String,
        step: i32,
        max_step: i32,
    },
    Outcome {
        title: String,
        message: String,
    },
}

/// Presenter that records everything it is asked to show.
pub struct RecordingPresenter {
    ready: AtomicBool,
    input_enabled: AtomicBool,
    presentations: Mutex<Vec<Presentation>>,
}

impl RecordingPresenter {
    /// Create a ready presenter with input enabled.
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
            input_enabled: AtomicBool::new(true),
            presentations: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the host coming and going.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Last value passed to `set_input_enabled`.
    pub fn input_enabled(&self) -> bool {
        self.input_enabled.load(Ordering::SeqCst)
    }

    /// Everything presented so far.
    pub fn presentations(&self) -> Vec<Presentation> {
        self.presentations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Outcomes presented so far.
    pub fn outcomes(&self) -> Vec<(String, String)> {
        self.presentations()
            .into_iter()
            .filter_map(|p| match p {
                Presentation::Outcome { title, message } => Some((title, message)),
                Presentation::Progress { .. } => None,
            })
            .collect()
    }

    /// Most recent progress presentation.
    pub fn last_progress(&self) -> Option<Presentation> {
        self.presentations()
            .into_iter()
            .rev()
            .find(|p| matches!(p, Presentation::Progress { .. }))
    }

    fn push(&self, presentation: Presentation) {
        self.presentations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(presentation);
    }
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncPresenter for RecordingPresenter {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.input_enabled.store(enabled, Ordering::SeqCst);
    }

    fn on_progress(
        &self,
        status: SyncStatus,
        progress_state: SyncProgressState,
        message: &str,
        step: i32,
        max_step: i32,
    ) {
        self.push(Presentation::Progress {
            status,
            progress_state,
            message: message.to_string(),
            step,
            max_step,
        });
    }

    fn on_outcome(&self, title: &str, message: &str) {
        self.push(Presentation::Outcome {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
