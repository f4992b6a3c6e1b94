//! Binding to the sync service with an observable connection state.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::service::SyncServiceInterface;

/// State of the binding to the sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No binding requested or the service went away.
    Unbound,
    /// Binding requested, service not yet available.
    Binding,
    /// Service available for calls.
    Bound,
}

/// Shared, possibly-not-yet-bound handle to the sync service.
///
/// Every caller shares one connection. State transitions are published on a
/// watch channel so waiters can wake as soon as the service binds.
pub struct ServiceConnection {
    service: RwLock<Option<Arc<dyn SyncServiceInterface>>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ServiceConnection {
    /// Create an unbound connection.
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Unbound);
        Self {
            service: RwLock::new(None),
            state_tx,
        }
    }

    /// Create a connection already bound to `service`.
    pub fn bound(service: Arc<dyn SyncServiceInterface>) -> Self {
        let connection = Self::new();
        connection.bind(service);
        connection
    }

    /// Mark that a bind has been requested.
    pub fn begin_binding(&self) {
        if self.state() == ConnectionState::Unbound {
            debug!("Sync service binding requested");
            self.state_tx.send_replace(ConnectionState::Binding);
        }
    }

    /// Attach the service once it becomes available.
    pub fn bind(&self, service: Arc<dyn SyncServiceInterface>) {
        *self.service.write().unwrap_or_else(|e| e.into_inner()) = Some(service);
        info!("Sync service bound");
        self.state_tx.send_replace(ConnectionState::Bound);
    }

    /// Detach the service after a disconnect.
    pub fn unbind(&self) {
        let previous = self
            .service
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if previous.is_some() {
            info!("Sync service unbound");
        }
        self.state_tx.send_replace(ConnectionState::Unbound);
    }

    /// The bound service, if any.
    pub fn service(&self) -> Option<Arc<dyn SyncServiceInterface>> {
        self.service
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }
}

impl Default for ServiceConnection {
    fn default() -> Self {
        Self::new()
    }
}
