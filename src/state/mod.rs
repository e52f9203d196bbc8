pub mod machine;
pub mod settings;
mod sse;
pub mod text;
pub mod timer;
pub mod whitelist;

use std::{sync::Arc, time::Duration};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::config_store::ConfigStore,
    error::ServiceError,
    state::{
        machine::{MaintenanceEvent, MaintenanceStateMachine, Plan, PlanId},
        settings::Settings,
        timer::TimerState,
        whitelist::Whitelist,
    },
};

pub use self::machine::MaintenancePhase;
pub use self::sse::{SseHub, SseState};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Upper bound on how long a persistence write may hold up a transition
/// before the plan is aborted.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
/// Handle used to push messages to a connected game session.
pub struct SessionConnection {
    /// Identity the session authenticated as.
    pub id: Uuid,
    /// Display name, informational only.
    pub name: String,
    /// Externally-decided capability exempting the session from gating.
    pub bypass: bool,
    /// Outbound channel towards the session socket.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state owning the settings and whitelist mirrors, the
/// maintenance state machine, the single countdown slot, and the session
/// registry.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn ConfigStore>,
    settings: RwLock<Settings>,
    whitelist: RwLock<Whitelist>,
    machine: RwLock<MaintenanceStateMachine>,
    timer: TimerState,
    sessions: DashMap<Uuid, SessionConnection>,
    sse: SseState,
    icon: RwLock<Option<Vec<u8>>>,
    maintenance_flag: watch::Sender<bool>,
    degraded: watch::Sender<bool>,
    mutation_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct the shared state from freshly loaded documents.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ConfigStore>,
        settings: Settings,
        whitelist: Whitelist,
    ) -> SharedState {
        let phase = MaintenancePhase::from_flag(settings.is_maintenance());
        let (maintenance_tx, _rx) = watch::channel(phase.as_flag());
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            config,
            store,
            settings: RwLock::new(settings),
            whitelist: RwLock::new(whitelist),
            machine: RwLock::new(MaintenanceStateMachine::new(phase)),
            timer: TimerState::new(),
            sessions: DashMap::new(),
            sse: SseState::new(16, 16),
            icon: RwLock::new(None),
            maintenance_flag: maintenance_tx,
            degraded: degraded_tx,
            mutation_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Persistence backend shared by settings and whitelist.
    pub fn store(&self) -> Arc<dyn ConfigStore> {
        self.store.clone()
    }

    /// Settings mirror.
    pub fn settings(&self) -> &RwLock<Settings> {
        &self.settings
    }

    /// Whitelist mirror.
    pub fn whitelist(&self) -> &RwLock<Whitelist> {
        &self.whitelist
    }

    /// Scheduler state holding the at-most-one active countdown.
    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    /// Registry of connected sessions keyed by identity.
    pub fn sessions(&self) -> &DashMap<Uuid, SessionConnection> {
        &self.sessions
    }

    /// Hub mirroring session-facing broadcasts.
    pub fn events_sse(&self) -> &SseHub {
        self.sse.events()
    }

    /// Hub for admin-only events.
    pub fn admin_sse(&self) -> &SseHub {
        self.sse.admin().hub()
    }

    /// Token guard ensuring a single admin SSE subscriber at a time.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        self.sse.admin().token()
    }

    /// Cached custom icon bytes, refreshed on load and reload.
    pub fn icon(&self) -> &RwLock<Option<Vec<u8>>> {
        &self.icon
    }

    /// Gate serializing every mutation of the settings/whitelist/timer
    /// triple. Mutating services take it for the whole
    /// check-persist-commit sequence.
    pub fn mutation_gate(&self) -> &Mutex<()> {
        &self.mutation_gate
    }

    /// Snapshot the current phase of the maintenance state machine.
    pub async fn phase(&self) -> MaintenancePhase {
        self.machine.read().await.phase()
    }

    /// Subscribe to maintenance flag updates; this is the notification
    /// channel for session-presence integrations.
    pub fn maintenance_watcher(&self) -> watch::Receiver<bool> {
        self.maintenance_flag.subscribe()
    }

    /// Current degraded flag (persistence backend unhealthy).
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Reload the cached icon bytes according to the icon toggle.
    pub async fn refresh_icon(&self) -> Result<(), ServiceError> {
        let wanted = self.settings.read().await.has_custom_icon();
        let bytes = if wanted {
            self.store.load_icon().await.map_err(ServiceError::from)?
        } else {
            None
        };
        *self.icon.write().await = bytes;
        Ok(())
    }

    /// Force the machine onto the phase a reloaded document carries and
    /// notify presence watchers. No transition side effects run; a reload
    /// adopts external state instead of causing evictions or broadcasts.
    pub async fn resync_phase(&self, phase: MaintenancePhase) -> Result<(), ServiceError> {
        let mut machine = self.machine.write().await;
        machine.resync(phase).map_err(ServiceError::from)?;
        self.maintenance_flag.send_replace(phase.as_flag());
        Ok(())
    }

    async fn plan_transition(&self, event: MaintenanceEvent) -> Result<Plan, ServiceError> {
        let mut machine = self.machine.write().await;
        machine.plan(event).map_err(Into::into)
    }

    async fn apply_planned_transition(
        &self,
        plan_id: PlanId,
    ) -> Result<MaintenancePhase, ServiceError> {
        let mut machine = self.machine.write().await;
        machine.apply(plan_id).map_err(Into::into)
    }

    async fn abort_transition(&self, plan_id: PlanId) {
        let mut machine = self.machine.write().await;
        if let Err(err) = machine.abort(plan_id) {
            warn!(plan_id = %plan_id, error = ?err, "failed to abort planned transition");
        }
    }

    /// Run `work` (the persistence write) between planning and applying a
    /// phase transition. The plan is aborted when the work fails or times
    /// out, so the phase never changes without its write. Callers must hold
    /// the mutation gate.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: MaintenanceEvent,
        work: F,
    ) -> Result<(T, MaintenancePhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    self.abort_transition(plan_id).await;
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                self.maintenance_flag.send_replace(next.as_flag());
                Ok((value, next))
            }
            Err(err) => {
                self.abort_transition(plan_id).await;
                Err(err)
            }
        }
    }
}
