//! Shared application state: store slot, per-client flows, round cache,
//! start signal, and SSE hubs.

pub mod flow;
pub mod round;
pub mod signal;
mod sse;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{config::AppConfig, dao::store::QuizStore, error::ServiceError, state::round::Round};

pub use self::flow::{FlowEvent, FlowPhase, FlowStateMachine, Plan, PlanId, Snapshot};
pub use self::signal::StartSignal;
pub use self::sse::SseHub;
use self::sse::SseState;

/// Cheaply clonable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Upper bound on how long a flow transition may stay pending.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// A single client's coordinator: its state machine plus the gate that keeps
/// transitions strictly sequential within that client.
pub struct ClientFlow {
    sm: Mutex<FlowStateMachine>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl ClientFlow {
    fn new(transition_timeout: Option<Duration>) -> Self {
        Self {
            sm: Mutex::new(FlowStateMachine::new()),
            transition_gate: Mutex::new(()),
            transition_timeout,
        }
    }

    /// Snapshot the flow's current phase and pending transition.
    pub async fn snapshot(&self) -> Snapshot {
        let sm = self.sm.lock().await;
        sm.snapshot()
    }

    /// Inspect the flow's current phase.
    pub async fn phase(&self) -> FlowPhase {
        let sm = self.sm.lock().await;
        sm.phase()
    }

    /// Plan `event`, run `work` while the transition is pending, then apply
    /// the plan on success or abort it on failure/timeout.
    ///
    /// The gate serializes transitions per client; a confirm arriving while
    /// another is outstanding waits its turn and is then rejected by `plan`
    /// if the phase no longer allows it.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: FlowEvent,
        work: F,
    ) -> Result<(T, FlowPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let plan = {
            let mut sm = self.sm.lock().await;
            sm.plan(event).map_err(ServiceError::from)?
        };
        let plan_id = plan.id;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    self.abort(plan_id).await;
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = {
                    let mut sm = self.sm.lock().await;
                    sm.apply(plan_id).map_err(ServiceError::from)?
                };
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                self.abort(plan_id).await;
                drop(gate);
                Err(err)
            }
        }
    }

    async fn abort(&self, plan_id: PlanId) {
        let mut sm = self.sm.lock().await;
        if let Err(abort_err) = sm.abort(plan_id) {
            warn!(
                plan_id = %plan_id,
                error = ?abort_err,
                "failed to abort flow transition"
            );
        }
    }
}

/// Central application state shared by all route handlers and services.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn QuizStore>>>,
    sse: SseState,
    flows: DashMap<Uuid, Arc<ClientFlow>>,
    round: RwLock<Option<Round>>,
    signal: StartSignal,
    degraded: watch::Sender<bool>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply. The application starts in degraded mode until a store backend
    /// is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            store: RwLock::new(None),
            sse: SseState::new(16, 16),
            flows: DashMap::new(),
            round: RwLock::new(None),
            signal: StartSignal::new(),
            degraded: degraded_tx,
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with a degraded-mode error.
    pub async fn require_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a store backend and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn QuizStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the admin SSE stream.
    pub fn admin_sse(&self) -> &SseHub {
        self.sse.admin().hub()
    }

    /// Token guard that ensures a single admin SSE subscriber at a time.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        self.sse.admin().token()
    }

    /// Shared start signal mirroring the persisted flag.
    pub fn signal(&self) -> &StartSignal {
        &self.signal
    }

    /// Issue a fresh opaque identity and create its flow in the lobby.
    pub fn register_identity(&self) -> Uuid {
        let identity_id = Uuid::new_v4();
        self.flows.insert(
            identity_id,
            Arc::new(ClientFlow::new(self.transition_timeout)),
        );
        identity_id
    }

    /// Look up the flow for an identity.
    pub fn flow(&self, identity_id: Uuid) -> Option<Arc<ClientFlow>> {
        self.flows
            .get(&identity_id)
            .map(|entry| entry.value().clone())
    }

    /// Look up the flow for an identity or fail as a missing login.
    pub fn require_flow(&self, identity_id: Uuid) -> Result<Arc<ClientFlow>, ServiceError> {
        self.flow(identity_id).ok_or_else(|| {
            ServiceError::NotLoggedIn(format!("unknown identity `{identity_id}`"))
        })
    }

    /// Drop every client flow; used when a brand-new round is seeded.
    pub fn clear_flows(&self) {
        self.flows.clear();
    }

    /// Cache the active round sequence.
    pub async fn install_round(&self, round: Round) {
        let mut guard = self.round.write().await;
        *guard = Some(round);
    }

    /// Clone of the active round sequence, if one is loaded.
    pub async fn round(&self) -> Option<Round> {
        let guard = self.round.read().await;
        guard.clone()
    }

    /// Clone of the active round sequence or a not-found error.
    pub async fn require_round(&self) -> Result<Round, ServiceError> {
        self.round()
            .await
            .ok_or_else(|| ServiceError::NotFound("no round has been seeded".into()))
    }
}
