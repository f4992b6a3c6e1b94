//! Verify-server-settings status poller.
//!
//! The poller reconciles a local [`VerifyAction`] with the status reported by
//! the sync service and decides what the UI shows. Each call to [`poll`] or
//! [`update`] is one complete tick; the returned [`Tick`] tells the caller
//! when to run the next one.
//!
//! [`poll`]: SyncStatusPoller::poll
//! [`update`]: SyncStatusPoller::update

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use odkservices_common::{AppName, Error, Result, ServerSettings};

use crate::config::PollerConfig;
use crate::connection::ServiceConnection;
use crate::outcome::render_outcome;
use crate::presenter::SyncPresenter;
use crate::retry::{RetryConfig, RetryExecutor};
use crate::service::SyncServiceInterface;
use crate::state::{PollerState, VerifyAction};
use crate::status::{SyncOverallResult, SyncProgressEvent, SyncProgressState, SyncStatus};

/// Progress message shown before the service reports any progress.
pub const VERIFY_STARTING_MESSAGE: &str = "Starting verification of server settings...";

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The service or host was unavailable; run the same tick again later.
    Retry,
    /// A verify is in flight; run [`SyncStatusPoller::update`] after the delay.
    Monitor(Duration),
    /// Nothing left to do until the user acts.
    Idle,
}

/// Remote status and progress read at the start of a tick.
struct Snapshot {
    service: Arc<dyn SyncServiceInterface>,
    status: SyncStatus,
    event: SyncProgressEvent,
}

/// Client-side state machine for verifying server settings.
pub struct SyncStatusPoller {
    app_name: AppName,
    server: ServerSettings,
    connection: Arc<ServiceConnection>,
    presenter: Arc<dyn SyncPresenter>,
    state: PollerState,
    monitor_interval: Duration,
    pickup_timeout: Duration,
    pickup_waited: Duration,
    completion: RetryExecutor,
}

impl SyncStatusPoller {
    /// Create an idle poller.
    pub fn new(
        config: &PollerConfig,
        connection: Arc<ServiceConnection>,
        presenter: Arc<dyn SyncPresenter>,
    ) -> Self {
        Self::restore(config, connection, presenter, PollerState::default())
    }

    /// Recreate a poller from state saved by [`save_state`](Self::save_state).
    pub fn restore(
        config: &PollerConfig,
        connection: Arc<ServiceConnection>,
        presenter: Arc<dyn SyncPresenter>,
        state: PollerState,
    ) -> Self {
        let poller = Self {
            app_name: config.app_name.clone(),
            server: config.server.clone(),
            connection,
            presenter,
            state,
            monitor_interval: config.monitor_interval,
            pickup_timeout: config.pickup_timeout,
            pickup_waited: Duration::ZERO,
            completion: RetryExecutor::new(config.retry.clone()),
        };
        // Input stays disabled until the first tick settles.
        poller.presenter.set_input_enabled(false);
        poller
    }

    /// Application being verified.
    pub fn app_name(&self) -> &AppName {
        &self.app_name
    }

    /// Current local action.
    pub fn action(&self) -> VerifyAction {
        self.state.action
    }

    /// State to persist across a host teardown.
    pub fn save_state(&self) -> PollerState {
        self.state
    }

    /// Retry policy used for completion calls.
    pub fn retry_config(&self) -> &RetryConfig {
        self.completion.config()
    }

    /// Whether the verify input may be enabled.
    pub fn can_verify(&self) -> bool {
        self.server.are_credentials_configured()
    }

    /// Replace the server settings, e.g. after the user edits them.
    pub fn set_server(&mut self, server: ServerSettings) {
        self.server = server;
        self.refresh_input();
    }

    /// Enable the verify input when idle and configured.
    pub fn refresh_input(&self) {
        let enabled = self.state.action == VerifyAction::Idle && self.can_verify();
        self.presenter.set_input_enabled(enabled);
    }

    /// User asked to verify the server settings.
    ///
    /// Nothing is sent to the service here; the next [`poll`](Self::poll)
    /// issues the call.
    pub fn request_verify(&mut self) -> Result<()> {
        if !self.can_verify() {
            return Err(Error::NotConfigured(format!(
                "no sync server configured for {}",
                self.app_name
            )));
        }

        info!("Verify server settings requested for {}", self.app_name);
        self.presenter.set_input_enabled(false);
        self.state.action = VerifyAction::Verify;
        self.state.outcome_shown = false;
        self.pickup_waited = Duration::ZERO;
        Ok(())
    }

    /// Result of the account authorization flow started before a verify.
    ///
    /// A cancelled authorization abandons the pending verify. Either way the
    /// caller polls again afterwards.
    pub fn on_authorization_result(&mut self, granted: bool) {
        if !granted {
            debug!("Authorization cancelled for {}", self.app_name);
            self.state.action = VerifyAction::Idle;
        }
    }

    /// Access the sync service and act on the current action.
    pub async fn poll(&mut self) -> Result<Tick> {
        let snapshot = match self.snapshot("poll").await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(Tick::Retry),
            Err(err) => return self.fail(err),
        };
        let Snapshot {
            service,
            status,
            event,
        } = snapshot;

        if status == SyncStatus::Syncing {
            self.state.action = VerifyAction::MonitorVerifying;
            self.pickup_waited = Duration::ZERO;
            return Ok(self.show_progress(status, &event));
        }

        match self.state.action {
            VerifyAction::Verify => {
                if let Err(err) = service.verify_server_settings(&self.app_name).await {
                    return self.fail(err);
                }
                self.state.action = VerifyAction::MonitorVerifying;
                let starting = SyncProgressEvent {
                    progress_state: None,
                    message: VERIFY_STARTING_MESSAGE.to_string(),
                    current_step: -1,
                    max_step: 0,
                };
                Ok(self.show_progress(SyncStatus::None, &starting))
            }
            VerifyAction::Idle if event.is_finished() && !self.state.outcome_shown => {
                let result = match service.get_sync_result(&self.app_name).await {
                    Ok(result) => result,
                    Err(err) => return self.fail(err),
                };
                self.show_outcome(status, &result);
                Ok(Tick::Idle)
            }
            action => {
                debug!(
                    "[{}] poll: nothing to do (action {}, status {})",
                    self.app_name, action, status
                );
                Ok(Tick::Idle)
            }
        }
    }

    /// Monitor tick scheduled while a verify is in flight.
    ///
    /// While the service has not picked up the request (`NONE`, progress not
    /// finished) monitoring continues for at most the configured pickup
    /// timeout; after that the verify is abandoned and input re-enabled.
    pub async fn update(&mut self) -> Result<Tick> {
        let snapshot = match self.snapshot("update").await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(Tick::Retry),
            Err(err) => return self.fail(err),
        };
        let Snapshot {
            service,
            status,
            event,
        } = snapshot;

        if status == SyncStatus::Syncing {
            self.state.action = VerifyAction::MonitorVerifying;
            self.pickup_waited = Duration::ZERO;
            return Ok(self.show_progress(status, &event));
        }

        if status == SyncStatus::None
            && !event.is_finished()
            && self.state.action == VerifyAction::MonitorVerifying
        {
            if self.pickup_waited >= self.pickup_timeout {
                warn!(
                    "[{}] sync service did not pick up the verify within {:?}",
                    self.app_name, self.pickup_timeout
                );
                self.abandon_verify();
                return Ok(Tick::Idle);
            }
            self.pickup_waited += self.monitor_interval;
            return Ok(Tick::Monitor(self.monitor_interval));
        }

        let result = match service.get_sync_result(&self.app_name).await {
            Ok(result) => result,
            Err(err) => return self.fail(err),
        };
        self.state.action = VerifyAction::Idle;
        if event.is_finished() {
            self.show_outcome(status, &result);
        } else {
            self.refresh_input();
        }
        Ok(Tick::Idle)
    }

    /// Release the app synchronizer after the outcome has been consumed.
    pub async fn complete_sync(&self) -> Result<()> {
        let connection = self.connection.clone();
        let app_name = self.app_name.clone();

        let cleared = self
            .completion
            .execute(|| {
                let connection = connection.clone();
                let app_name = app_name.clone();
                async move {
                    let service = connection.service().ok_or_else(|| {
                        Error::ServiceDisconnected("sync service not bound".to_string())
                    })?;
                    service.clear_app_synchronizer(&app_name).await
                }
            })
            .await?;

        if !cleared {
            return Err(Error::InvalidState(format!(
                "could not remove app synchronizer for {}",
                self.app_name
            )));
        }
        info!("App synchronizer cleared for {}", self.app_name);
        Ok(())
    }

    /// Read status and progress, or `None` if this tick must be retried.
    async fn snapshot(&self, tick: &str) -> Result<Option<Snapshot>> {
        if !self.presenter.is_ready() {
            debug!("[{}] {}: host not ready", self.app_name, tick);
            return Ok(None);
        }
        let Some(service) = self.connection.service() else {
            debug!("[{}] {}: sync service not bound", self.app_name, tick);
            return Ok(None);
        };

        let status = match service.get_sync_status(&self.app_name).await {
            Ok(status) => status,
            Err(err) if err.is_transient() => {
                debug!("[{}] {}: {}", self.app_name, tick, err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let event = match service.get_sync_progress_event(&self.app_name).await {
            Ok(event) => event,
            Err(err) if err.is_transient() => {
                debug!("[{}] {}: {}", self.app_name, tick, err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        Ok(Some(Snapshot {
            service,
            status,
            event,
        }))
    }

    /// Transient errors retry the tick; anything else ends the verify.
    fn fail(&mut self, err: Error) -> Result<Tick> {
        if err.is_transient() {
            debug!("Service call raced a disconnect: {}", err);
            return Ok(Tick::Retry);
        }
        warn!("[{}] verify aborted: {}", self.app_name, err);
        self.abandon_verify();
        Err(err)
    }

    fn abandon_verify(&mut self) {
        self.state.action = VerifyAction::Idle;
        self.pickup_waited = Duration::ZERO;
        self.refresh_input();
    }

    fn show_progress(&self, status: SyncStatus, event: &SyncProgressEvent) -> Tick {
        if self.state.action != VerifyAction::MonitorVerifying {
            return Tick::Idle;
        }

        self.presenter.set_input_enabled(false);
        let progress_state = event.progress_state.unwrap_or(SyncProgressState::Inactive);
        self.presenter.on_progress(
            status,
            progress_state,
            &event.message,
            event.current_step,
            event.max_step,
        );

        if status.keeps_monitoring() {
            Tick::Monitor(self.monitor_interval)
        } else {
            Tick::Idle
        }
    }

    fn show_outcome(&mut self, status: SyncStatus, result: &SyncOverallResult) {
        if self.state.action != VerifyAction::Idle || self.state.outcome_shown {
            return;
        }

        for (table, table_status) in result.failed_tables() {
            warn!("[{}] table {} finished with {}", self.app_name, table, table_status);
        }

        let outcome = render_outcome(status);
        info!("[{}] verify finished: {}", self.app_name, status);
        self.presenter.on_outcome(outcome.title, outcome.message);
        self.state.outcome_shown = true;
        self.refresh_input();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemorySyncService, ScriptedRun};
    use crate::presenter::{Presentation, RecordingPresenter};

    struct Fixture {
        service: Arc<MemorySyncService>,
        connection: Arc<ServiceConnection>,
        presenter: Arc<RecordingPresenter>,
        poller: SyncStatusPoller,
    }

    fn config() -> PollerConfig {
        PollerConfig::new(
            AppName::default(),
            ServerSettings::anonymous("https://odk.example.org"),
        )
        .with_retry(RetryConfig::fixed(3, Duration::from_millis(1)))
    }

    fn fixture(service: MemorySyncService) -> Fixture {
        let service = Arc::new(service);
        let connection = Arc::new(ServiceConnection::bound(service.clone()));
        let presenter = Arc::new(RecordingPresenter::new());
        let poller = SyncStatusPoller::new(&config(), connection.clone(), presenter.clone());
        Fixture {
            service,
            connection,
            presenter,
            poller,
        }
    }

    #[tokio::test]
    async fn test_unbound_service_schedules_one_retry() {
        let connection = Arc::new(ServiceConnection::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let mut poller = SyncStatusPoller::new(&config(), connection, presenter.clone());
        poller.request_verify().unwrap();
        let before = poller.save_state();

        assert_eq!(poller.poll().await.unwrap(), Tick::Retry);
        assert_eq!(poller.save_state(), before);
        assert!(presenter.presentations().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_during_poll_schedules_retry() {
        let mut f = fixture(MemorySyncService::new());
        f.poller.request_verify().unwrap();
        f.service.set_disconnected(true);

        assert_eq!(f.poller.poll().await.unwrap(), Tick::Retry);
        assert_eq!(f.poller.action(), VerifyAction::Verify);
        assert_eq!(f.service.verify_calls(), 0);
    }

    #[tokio::test]
    async fn test_host_not_ready_schedules_retry() {
        let mut f = fixture(MemorySyncService::finished(SyncStatus::SyncComplete));
        f.presenter.set_ready(false);

        assert_eq!(f.poller.poll().await.unwrap(), Tick::Retry);
        assert_eq!(f.service.status_queries(), 0);
        assert!(f.presenter.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_request_verify_then_poll_starts_verify() {
        let mut f = fixture(MemorySyncService::new());
        f.poller.request_verify().unwrap();
        assert_eq!(f.poller.action(), VerifyAction::Verify);
        assert!(!f.presenter.input_enabled());

        let tick = f.poller.poll().await.unwrap();

        assert_eq!(tick, Tick::Monitor(Duration::from_millis(150)));
        assert_eq!(f.service.verify_calls(), 1);
        assert_eq!(f.poller.action(), VerifyAction::MonitorVerifying);
        assert_eq!(
            f.presenter.last_progress(),
            Some(Presentation::Progress {
                status: SyncStatus::None,
                progress_state: SyncProgressState::Inactive,
                message: VERIFY_STARTING_MESSAGE.to_string(),
                step: -1,
                max_step: 0,
            })
        );
    }

    #[tokio::test]
    async fn test_request_verify_requires_server() {
        let connection = Arc::new(ServiceConnection::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let mut poller = SyncStatusPoller::new(
            &PollerConfig::default(),
            connection,
            presenter.clone(),
        );

        assert!(!poller.can_verify());
        assert!(matches!(poller.request_verify(), Err(Error::NotConfigured(_))));
        assert_eq!(poller.action(), VerifyAction::Idle);
    }

    #[tokio::test]
    async fn test_remote_syncing_forces_monitor() {
        for start in [VerifyAction::Idle, VerifyAction::Verify, VerifyAction::MonitorVerifying] {
            let mut f = fixture(MemorySyncService::new());
            f.poller.state.action = start;
            f.service.set_state(
                SyncStatus::Syncing,
                SyncProgressEvent::new(SyncProgressState::Rows, "Rows", 4, 10),
            );

            for _ in 0..3 {
                let tick = f.poller.poll().await.unwrap();
                assert!(matches!(tick, Tick::Monitor(_)));
                assert_eq!(f.poller.action(), VerifyAction::MonitorVerifying);
            }
            assert_eq!(f.service.verify_calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_monitor_stays_while_syncing() {
        let mut f = fixture(MemorySyncService::new());
        f.service.plan_run(ScriptedRun::verify(SyncStatus::SyncComplete));
        f.poller.request_verify().unwrap();
        f.poller.poll().await.unwrap();

        for _ in 0..3 {
            assert!(matches!(f.poller.update().await.unwrap(), Tick::Monitor(_)));
            assert_eq!(f.poller.action(), VerifyAction::MonitorVerifying);
        }
        assert_eq!(f.poller.update().await.unwrap(), Tick::Idle);
        assert_eq!(f.poller.action(), VerifyAction::Idle);
    }

    #[tokio::test]
    async fn test_finished_idle_shows_outcome() {
        let mut f = fixture(MemorySyncService::finished(SyncStatus::SyncComplete));

        assert_eq!(f.poller.poll().await.unwrap(), Tick::Idle);
        let outcomes = f.presenter.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0, "Verify Server Settings Successful");
        assert_eq!(f.poller.action(), VerifyAction::Idle);
        assert!(f.presenter.input_enabled());
    }

    #[tokio::test]
    async fn test_outcome_shown_once() {
        let mut f = fixture(MemorySyncService::finished(SyncStatus::SyncComplete));

        f.poller.poll().await.unwrap();
        f.poller.poll().await.unwrap();
        f.poller.poll().await.unwrap();
        assert_eq!(f.presenter.outcomes().len(), 1);

        // A new verify re-arms the outcome.
        f.service.plan_run(ScriptedRun::verify(SyncStatus::AuthenticationError));
        f.poller.request_verify().unwrap();
        f.poller.poll().await.unwrap();
        while let Tick::Monitor(_) = f.poller.update().await.unwrap() {}

        let outcomes = f.presenter.outcomes();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].0, "User Authorization Failure");
    }

    #[tokio::test]
    async fn test_idle_without_finished_event_does_nothing() {
        let mut f = fixture(MemorySyncService::new());
        f.service
            .set_state(SyncStatus::AuthenticationError, SyncProgressEvent::inactive());

        assert_eq!(f.poller.poll().await.unwrap(), Tick::Idle);
        assert!(f.presenter.presentations().is_empty());
    }

    #[tokio::test]
    async fn test_monitor_not_syncing_on_poll_waits() {
        let mut f = fixture(MemorySyncService::finished(SyncStatus::SyncComplete));
        f.poller.state.action = VerifyAction::MonitorVerifying;

        assert_eq!(f.poller.poll().await.unwrap(), Tick::Idle);
        assert_eq!(f.poller.action(), VerifyAction::MonitorVerifying);
        assert!(f.presenter.presentations().is_empty());

        // The monitor tick resolves it.
        assert_eq!(f.poller.update().await.unwrap(), Tick::Idle);
        assert_eq!(f.presenter.outcomes().len(), 1);
    }

    #[tokio::test]
    async fn test_update_waits_for_service_pickup() {
        let mut f = fixture(MemorySyncService::new());
        f.poller.state.action = VerifyAction::MonitorVerifying;

        assert!(matches!(f.poller.update().await.unwrap(), Tick::Monitor(_)));
        assert_eq!(f.poller.action(), VerifyAction::MonitorVerifying);
    }

    #[tokio::test]
    async fn test_update_gives_up_when_never_picked_up() {
        let service = Arc::new(MemorySyncService::new());
        let connection = Arc::new(ServiceConnection::bound(service.clone()));
        let presenter = Arc::new(RecordingPresenter::new());
        let config = config().with_pickup_timeout(Duration::from_millis(450));
        let mut poller = SyncStatusPoller::new(&config, connection, presenter.clone());
        poller.request_verify().unwrap();
        poller.state.action = VerifyAction::MonitorVerifying;

        for _ in 0..3 {
            assert!(matches!(poller.update().await.unwrap(), Tick::Monitor(_)));
        }
        assert_eq!(poller.update().await.unwrap(), Tick::Idle);
        assert_eq!(poller.action(), VerifyAction::Idle);
        assert!(presenter.input_enabled());
        assert!(presenter.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_syncing_resets_pickup_wait() {
        let service = Arc::new(MemorySyncService::new());
        let connection = Arc::new(ServiceConnection::bound(service.clone()));
        let presenter = Arc::new(RecordingPresenter::new());
        let config = config().with_pickup_timeout(Duration::from_millis(150));
        let mut poller = SyncStatusPoller::new(&config, connection, presenter.clone());
        poller.state.action = VerifyAction::MonitorVerifying;

        assert!(matches!(poller.update().await.unwrap(), Tick::Monitor(_)));
        service.set_state(
            SyncStatus::Syncing,
            SyncProgressEvent::new(SyncProgressState::AppFiles, "App files", 1, 3),
        );
        assert!(matches!(poller.update().await.unwrap(), Tick::Monitor(_)));

        service.set_state(SyncStatus::None, SyncProgressEvent::inactive());
        assert!(matches!(poller.update().await.unwrap(), Tick::Monitor(_)));
        assert_eq!(poller.action(), VerifyAction::MonitorVerifying);
    }

    /// Service that rejects verify requests or result lookups outright.
    struct RejectingService {
        status: SyncStatus,
        event: SyncProgressEvent,
        reject_verify: bool,
    }

    #[async_trait::async_trait]
    impl SyncServiceInterface for RejectingService {
        async fn get_sync_status(&self, _app: &AppName) -> Result<SyncStatus> {
            Ok(self.status)
        }

        async fn get_sync_progress_event(&self, _app: &AppName) -> Result<SyncProgressEvent> {
            Ok(self.event.clone())
        }

        async fn get_sync_result(&self, _app: &AppName) -> Result<SyncOverallResult> {
            Err(Error::Remote("result unavailable".to_string()))
        }

        async fn verify_server_settings(&self, _app: &AppName) -> Result<()> {
            if self.reject_verify {
                return Err(Error::Remote("verify rejected".to_string()));
            }
            Ok(())
        }

        async fn synchronize_with_server(
            &self,
            _app: &AppName,
            _attachment_state: crate::status::SyncAttachmentState,
        ) -> Result<()> {
            Ok(())
        }

        async fn clear_app_synchronizer(&self, _app: &AppName) -> Result<bool> {
            Ok(true)
        }
    }

    fn rejecting_poller(service: RejectingService) -> (SyncStatusPoller, Arc<RecordingPresenter>) {
        let connection = Arc::new(ServiceConnection::bound(Arc::new(service)));
        let presenter = Arc::new(RecordingPresenter::new());
        let poller = SyncStatusPoller::new(&config(), connection, presenter.clone());
        (poller, presenter)
    }

    #[tokio::test]
    async fn test_rejected_verify_returns_to_idle() {
        let (mut poller, presenter) = rejecting_poller(RejectingService {
            status: SyncStatus::None,
            event: SyncProgressEvent::inactive(),
            reject_verify: true,
        });
        poller.request_verify().unwrap();
        assert!(!presenter.input_enabled());

        let err = poller.poll().await.unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(poller.action(), VerifyAction::Idle);
        assert!(presenter.input_enabled());

        // The user can start over.
        poller.request_verify().unwrap();
        assert_eq!(poller.action(), VerifyAction::Verify);
    }

    #[tokio::test]
    async fn test_failed_result_lookup_returns_to_idle() {
        let (mut poller, presenter) = rejecting_poller(RejectingService {
            status: SyncStatus::SyncComplete,
            event: SyncProgressEvent::finished("Done"),
            reject_verify: false,
        });
        poller.request_verify().unwrap();
        poller.state.action = VerifyAction::MonitorVerifying;

        let err = poller.update().await.unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(poller.action(), VerifyAction::Idle);
        assert!(presenter.input_enabled());
        assert!(presenter.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_authorization_cancelled() {
        let mut f = fixture(MemorySyncService::new());
        f.poller.request_verify().unwrap();
        f.poller.on_authorization_result(false);
        assert_eq!(f.poller.action(), VerifyAction::Idle);

        assert_eq!(f.poller.poll().await.unwrap(), Tick::Idle);
        assert_eq!(f.service.verify_calls(), 0);
    }

    #[tokio::test]
    async fn test_authorization_granted_keeps_verify() {
        let mut f = fixture(MemorySyncService::new());
        f.poller.request_verify().unwrap();
        f.poller.on_authorization_result(true);
        assert_eq!(f.poller.action(), VerifyAction::Verify);
    }

    #[tokio::test]
    async fn test_restore_keeps_action() {
        let mut f = fixture(MemorySyncService::new());
        f.poller.request_verify().unwrap();
        let saved = f.poller.save_state().to_json().unwrap();

        let presenter = Arc::new(RecordingPresenter::new());
        let mut restored = SyncStatusPoller::restore(
            &config(),
            f.connection.clone(),
            presenter.clone(),
            PollerState::from_json(&saved).unwrap(),
        );
        assert_eq!(restored.action(), VerifyAction::Verify);

        restored.poll().await.unwrap();
        assert_eq!(f.service.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_complete_sync() {
        let f = fixture(MemorySyncService::finished(SyncStatus::SyncComplete));
        f.poller.complete_sync().await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_sync_while_running_fails() {
        let mut f = fixture(MemorySyncService::new());
        f.poller.request_verify().unwrap();
        f.poller.poll().await.unwrap();

        let err = f.poller.complete_sync().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_complete_sync_unbound_exhausts_retries() {
        let f = fixture(MemorySyncService::new());
        f.connection.unbind();

        let err = f.poller.complete_sync().await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_set_server_refreshes_input() {
        let connection = Arc::new(ServiceConnection::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let mut poller =
            SyncStatusPoller::new(&PollerConfig::default(), connection, presenter.clone());
        assert!(!presenter.input_enabled());

        poller.set_server(ServerSettings::anonymous("https://odk.example.org"));
        assert!(presenter.input_enabled());
    }
}
