// ── Router abstraction ──
//
// Full lifecycle management for one monitored router: discovery,
// per-cadence background polling, command routing, and the snapshot and
// health read model. All state is owned by the `Router` instance; nothing
// is process-global, so any number of routers can run side by side.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use strum::EnumCount;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use peplink_api::{PeplinkClient, Session, TlsMode, TransportConfig};

use crate::command::{Command, CommandEnvelope, CommandResult, route_command};
use crate::config::{RouterConfig, TlsVerification};
use crate::convert;
use crate::endpoint::{Endpoint, Record};
use crate::error::CoreError;
use crate::health::{HealthMonitor, HealthState};
use crate::model::topology::DISCOVERY_WAN_IDS;
use crate::model::{Priority, Topology, WanId};
use crate::scheduler::{self, Cadence, TickOutcome};
use crate::session::{AuthState, SessionManager};
use crate::store::{Aggregator, Snapshot};

const COMMAND_CHANNEL_SIZE: usize = 16;

// ── RouterState ──────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Engine ───────────────────────────────────────────────────────

/// Everything built from one `RouterConfig`. Replaced wholesale on
/// reconfigure; background tasks hold their own `Arc` to the engine they
/// were spawned for.
pub(crate) struct Engine {
    pub(crate) config: RouterConfig,
    pub(crate) api: PeplinkClient,
    pub(crate) session: SessionManager,
    pub(crate) store: Aggregator,
    health: HealthMonitor,
    tick_guards: [Mutex<()>; Cadence::COUNT],
}

impl Engine {
    fn new(config: RouterConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
        };
        let api = PeplinkClient::new(config.url.clone(), &transport)?;
        let session = SessionManager::new(api.clone(), config.auth.clone(), config.login);

        Ok(Self {
            health: HealthMonitor::new(config.stale_tolerance),
            store: Aggregator::new(),
            tick_guards: std::array::from_fn(|_| Mutex::new(())),
            config,
            api,
            session,
        })
    }

    pub(crate) fn tick_guard(&self, cadence: Cadence) -> &Mutex<()> {
        &self.tick_guards[cadence.index()]
    }

    /// Run one router call through the session manager and record its
    /// reachability outcome.
    pub(crate) async fn call<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T, peplink_api::Error>>,
    {
        let result = self.session.call(op).await;
        self.health.record_call(&result);
        result
    }

    pub(crate) async fn fetch(
        &self,
        endpoint: Endpoint,
        wan_ids: &[u32],
    ) -> Result<Record, CoreError> {
        let api = &self.api;
        let result = self
            .call(|session| async move { endpoint.fetch(api, &session, wan_ids).await })
            .await;
        if let Err(e) = &result {
            debug!(%endpoint, error = %e, "fetch failed");
        }
        result
    }

    /// Probe every WAN id the router may use and, with VPN polling on, its
    /// VPN profiles. The responding WANs become the topology.
    pub(crate) async fn discover(&self) -> Result<Arc<Topology>, CoreError> {
        let api = &self.api;
        let ids: Vec<u32> = DISCOVERY_WAN_IDS.collect();
        let ids = ids.as_slice();

        let wans = self
            .call(|session| async move { api.wan_status(&session, ids).await })
            .await?;

        let vpn_profiles = if self.config.cadences.vpn.enabled {
            match self
                .call(|session| async move { api.pepvpn_status(&session).await })
                .await
            {
                Ok(raw) => convert::vpn_profiles(&raw),
                Err(e) => {
                    warn!(error = %e, "VPN profile discovery failed (non-fatal)");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let topology = convert::topology(&wans, vpn_profiles, Utc::now());
        info!(
            wans = topology.wans.len(),
            vpn_profiles = topology.vpn_profiles.len(),
            "hardware discovered"
        );
        self.store.set_topology(topology);
        Ok(self.store.topology())
    }

    pub(crate) fn refresh_health(&self) -> Arc<HealthState> {
        let authenticated = self.session.auth_state() != AuthState::Rejected;
        self.health
            .recompute(&self.store, &self.config.cadences, authenticated)
    }
}

// ── Router ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<RouterInner>`. Consumers read
/// [`snapshot()`](Self::snapshot) and [`health()`](Self::health) on their
/// own schedule; the router never pushes to them.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    engine: ArcSwap<Engine>,
    state: watch::Sender<RouterState>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current connection; cancelled on shutdown,
    /// replaced on the next connect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Router {
    /// Validate `config` and build the HTTP client. Does NOT connect;
    /// call [`connect()`](Self::connect) to discover and start polling.
    pub fn new(config: RouterConfig) -> Result<Self, CoreError> {
        let engine = Engine::new(config)?;
        let (state, _) = watch::channel(RouterState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(RouterInner {
                engine: ArcSwap::from_pointee(engine),
                state,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    fn engine(&self) -> Arc<Engine> {
        self.inner.engine.load_full()
    }

    pub fn config(&self) -> RouterConfig {
        self.engine().config.clone()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Discover the router's WANs, then spawn the command processor and
    /// one scheduler per enabled cadence.
    ///
    /// Discovery failure (including rejected credentials) fails the
    /// connect and leaves the router in [`RouterState::Failed`].
    pub async fn connect(&self) -> Result<(), CoreError> {
        if *self.inner.state.borrow() == RouterState::Connected {
            return Ok(());
        }
        self.inner.state.send_replace(RouterState::Connecting);

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let engine = self.engine();
        if let Err(e) = engine.discover().await {
            engine.refresh_health();
            self.inner.state.send_replace(RouterState::Failed);
            return Err(e);
        }
        engine.refresh_health();

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(command_processor_task(
                engine,
                rx,
                child.clone(),
            )));
        }

        if engine.config.polling_enabled {
            for (cadence, period) in engine.config.cadences.active() {
                let engine = Arc::clone(&engine);
                handles.push(tokio::spawn(scheduler::cadence_task(
                    engine,
                    cadence,
                    period,
                    child.clone(),
                )));
            }
        }

        self.inner.state.send_replace(RouterState::Connected);
        info!(url = %engine.config.url, "router connected");
        Ok(())
    }

    /// Cancel every background task and wait for them to finish. In-flight
    /// requests run to completion or timeout, but their results are
    /// discarded.
    pub async fn shutdown(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        // Fresh command channel so a later connect can spawn a new processor.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner.state.send_replace(RouterState::Disconnected);
        debug!("router shut down");
    }

    /// Tear everything down and start again from `config`: new session,
    /// new schedulers, empty snapshot.
    pub async fn reconfigure(&self, config: RouterConfig) -> Result<(), CoreError> {
        let engine = Engine::new(config)?;
        self.shutdown().await;
        self.inner.engine.store(Arc::new(engine));
        info!("router reconfigured");
        self.connect().await
    }

    /// One-shot: connect without background polling, run `f`, shut down.
    pub async fn oneshot<F, Fut, T>(config: RouterConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Router) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.polling_enabled = false;

        let router = Router::new(cfg)?;
        router.connect().await?;
        let result = f(router.clone()).await;
        router.shutdown().await;
        result
    }

    // ── Read model ───────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        self.engine().store.read()
    }

    pub fn health(&self) -> Arc<HealthState> {
        self.engine().health.current()
    }

    pub fn topology(&self) -> Arc<Topology> {
        self.engine().store.topology()
    }

    pub fn state(&self) -> watch::Receiver<RouterState> {
        self.inner.state.subscribe()
    }

    pub fn auth_state(&self) -> AuthState {
        self.engine().session.auth_state()
    }

    /// Login requests issued by the current session manager.
    pub fn login_count(&self) -> u64 {
        self.engine().session.login_count()
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one tick of `cadence` immediately, outside its timer.
    pub async fn poll_now(&self, cadence: Cadence) -> Result<TickOutcome, CoreError> {
        self.require_connected()?;
        let engine = self.engine();
        if !engine.config.cadences.get(cadence).enabled {
            return Err(CoreError::ValidationFailed {
                message: format!("{cadence} polling is disabled"),
            });
        }
        let cancel = self.inner.cancel_child.lock().await.clone();
        scheduler::tick_now(&engine, cadence, &cancel)
            .await
            .ok_or(CoreError::RouterStopped)
    }

    /// Poll every enabled cadence once, concurrently.
    pub async fn poll_all(&self) -> Result<Vec<(Cadence, TickOutcome)>, CoreError> {
        let cadences: Vec<Cadence> = self
            .engine()
            .config
            .cadences
            .active()
            .map(|(c, _)| c)
            .collect();
        let results =
            futures_util::future::join_all(cadences.iter().map(|c| self.poll_now(*c))).await;
        cadences
            .into_iter()
            .zip(results)
            .map(|(c, r)| r.map(|outcome| (c, outcome)))
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Send a command to the command processor and await its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        self.require_connected()?;

        let (tx, rx) = tokio::sync::oneshot::channel();
        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::RouterStopped)?;

        rx.await.map_err(|_| CoreError::RouterStopped)?
    }

    pub async fn set_priority(&self, wan: WanId, priority: Priority) -> Result<(), CoreError> {
        self.execute(Command::SetWanPriority { wan, priority })
            .await
            .map(|_| ())
    }

    pub async fn reset_modem(&self, wan: WanId) -> Result<(), CoreError> {
        self.execute(Command::ResetModem { wan }).await.map(|_| ())
    }

    pub async fn rediscover_hardware(&self) -> Result<Arc<Topology>, CoreError> {
        match self.execute(Command::RediscoverHardware).await? {
            CommandResult::Rediscovered(topology) => Ok(topology),
            CommandResult::Ok => Ok(self.topology()),
        }
    }

    fn require_connected(&self) -> Result<(), CoreError> {
        if *self.inner.state.borrow() == RouterState::Connected {
            Ok(())
        } else {
            Err(CoreError::RouterStopped)
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn command_processor_task(
    engine: Arc<Engine>,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&engine, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}
