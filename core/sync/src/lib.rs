//! ODK Services sync status poller
//!
//! This module bridges a UI to the out-of-process sync service, including:
//! - Remote status, progress, and result types
//! - A shared service connection with an observable state
//! - The verify-server-settings action state machine
//! - Outcome text for every remote status
//! - A tick driver with bounded, reconnect-aware retry
//! - An in-memory scripted sync service

pub mod config;
pub mod connection;
pub mod driver;
pub mod memory;
pub mod outcome;
pub mod poller;
pub mod presenter;
pub mod retry;
pub mod service;
pub mod state;
pub mod status;

// Re-export main types
pub use config::PollerConfig;
pub use connection::{ConnectionState, ServiceConnection};
pub use driver::{PollerDriver, RunOutcome, ShutdownHandle};
pub use memory::{MemorySyncService, ScriptedRun};
pub use outcome::{render_outcome, Outcome};
pub use poller::{SyncStatusPoller, Tick, VERIFY_STARTING_MESSAGE};
pub use presenter::{Presentation, RecordingPresenter, SyncPresenter};
pub use retry::{RetryConfig, RetryExecutor};
pub use service::SyncServiceInterface;
pub use state::{PollerState, VerifyAction};
pub use status::{
    SyncAttachmentState, SyncOverallResult, SyncProgressEvent, SyncProgressState, SyncStatus,
};
