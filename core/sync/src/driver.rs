//! Cooperative tick loop that drives a [`SyncStatusPoller`].

use std::future::pending;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use odkservices_common::{Error, Result};

use crate::connection::ConnectionState;
use crate::poller::{SyncStatusPoller, Tick};
use crate::retry::RetryConfig;
use crate::state::VerifyAction;

/// How a driver run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The poller went idle; nothing further is scheduled.
    Settled,
    /// The host was torn down before the poller settled.
    Shutdown,
}

/// Which tick the driver runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Access,
    Monitor,
}

/// Handle for stopping a running driver.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Stop rescheduling ticks.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Runs poller ticks one at a time on the current task.
///
/// Retry ticks back off per [`RetryConfig`] and wake early when the service
/// connection changes state; the run fails with
/// [`Error::ServiceUnavailable`] once the retry budget is spent.
pub struct PollerDriver {
    poller: SyncStatusPoller,
    retry: RetryConfig,
    connection_rx: watch::Receiver<ConnectionState>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollerDriver {
    /// Create a driver for `poller`, using the poller's retry policy.
    pub fn new(
        poller: SyncStatusPoller,
        connection_rx: watch::Receiver<ConnectionState>,
    ) -> (Self, ShutdownHandle) {
        let retry = poller.retry_config().clone();
        let (tx, shutdown_rx) = watch::channel(false);

        let driver = Self {
            poller,
            retry,
            connection_rx,
            shutdown_rx,
        };
        (driver, ShutdownHandle { tx })
    }

    /// The driven poller.
    pub fn poller(&self) -> &SyncStatusPoller {
        &self.poller
    }

    /// Mutable access to the driven poller between runs.
    pub fn poller_mut(&mut self) -> &mut SyncStatusPoller {
        &mut self.poller
    }

    /// Give the poller back, e.g. to save its state.
    pub fn into_poller(self) -> SyncStatusPoller {
        self.poller
    }

    /// Request a verify and run until its outcome is shown.
    pub async fn verify(&mut self) -> Result<RunOutcome> {
        self.poller.request_verify()?;
        self.run().await
    }

    /// Run ticks until the poller settles or the driver is shut down.
    ///
    /// A poller restored mid-verify resumes with monitor ticks.
    pub async fn run(&mut self) -> Result<RunOutcome> {
        let mut stage = if self.poller.action() == VerifyAction::MonitorVerifying {
            Stage::Monitor
        } else {
            Stage::Access
        };
        let mut attempt = 0u32;

        loop {
            if *self.shutdown_rx.borrow() {
                info!("Poller for {} shut down", self.poller.app_name());
                return Ok(RunOutcome::Shutdown);
            }

            let tick = match stage {
                Stage::Access => self.poller.poll().await?,
                Stage::Monitor => self.poller.update().await?,
            };

            match tick {
                Tick::Retry => {
                    attempt += 1;
                    if attempt > self.retry.max_retries {
                        warn!(
                            "Sync service for {} still unavailable after {} attempts",
                            self.poller.app_name(),
                            attempt
                        );
                        return Err(Error::ServiceUnavailable(format!(
                            "no response for {} after {} attempts",
                            self.poller.app_name(),
                            attempt
                        )));
                    }
                    let delay = self.retry.delay_for_attempt(attempt - 1);
                    debug!("Tick {:?} retry {} in {:?}", stage, attempt, delay);
                    if self.wait(delay, true).await {
                        return Ok(RunOutcome::Shutdown);
                    }
                }
                Tick::Monitor(delay) => {
                    attempt = 0;
                    stage = Stage::Monitor;
                    if self.wait(delay, false).await {
                        return Ok(RunOutcome::Shutdown);
                    }
                }
                Tick::Idle => {
                    debug!("Poller for {} settled", self.poller.app_name());
                    return Ok(RunOutcome::Settled);
                }
            }
        }
    }

    /// Sleep for `delay`, returning `true` if shut down meanwhile.
    ///
    /// With `wake_on_connection` a connection state change ends the wait early.
    async fn wait(&mut self, delay: Duration, wake_on_connection: bool) -> bool {
        let connection_rx = &mut self.connection_rx;
        let shutdown_rx = &mut self.shutdown_rx;

        tokio::select! {
            _ = sleep(delay) => false,
            _ = connection_changed(connection_rx), if wake_on_connection => {
                debug!("Connection state changed, retrying early");
                false
            }
            _ = shutdown_requested(shutdown_rx) => true,
        }
    }
}

async fn connection_changed(rx: &mut watch::Receiver<ConnectionState>) {
    if rx.changed().await.is_err() {
        pending::<()>().await;
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            pending::<()>().await;
        }
    }
}
