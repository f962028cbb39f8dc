// ── Command gateway ──
//
// Mutating requests travel through an mpsc channel to the router's
// command processor, which routes each one to a single API call through
// the session manager. Commands never write to the snapshot; their effect
// shows up when the next regular poll observes it.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::info;

use crate::error::CoreError;
use crate::model::{Priority, Topology, WanId, WanKind};
use crate::router::Engine;

/// A mutating request against the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetWanPriority { wan: WanId, priority: Priority },
    ResetModem { wan: WanId },
    /// Re-run WAN (and VPN profile) discovery.
    RediscoverHardware,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Rediscovered(Arc<Topology>),
}

pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Route one command to its API call.
pub(crate) async fn route_command(
    engine: &Engine,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let result = match cmd {
        Command::SetWanPriority { wan, priority } => set_priority(engine, wan, priority).await,
        Command::ResetModem { wan } => reset_modem(engine, wan).await,
        Command::RediscoverHardware => engine.discover().await.map(|topology| {
            engine.store.clear_unsupported();
            CommandResult::Rediscovered(topology)
        }),
    };

    engine.refresh_health();
    result
}

async fn set_priority(
    engine: &Engine,
    wan: WanId,
    priority: Priority,
) -> Result<CommandResult, CoreError> {
    require_wan(engine, wan)?;
    let api = &engine.api;
    engine
        .call(|session| async move {
            api.set_wan_priority(&session, wan.get(), priority.as_level())
                .await
        })
        .await
        .map(|()| {
            info!(%wan, %priority, "WAN priority changed");
            CommandResult::Ok
        })
}

async fn reset_modem(engine: &Engine, wan: WanId) -> Result<CommandResult, CoreError> {
    let kind = require_wan(engine, wan)?;
    if kind != WanKind::Cellular {
        return Err(CoreError::ValidationFailed {
            message: format!("WAN {wan} is {kind}, only cellular modems can be reset"),
        });
    }
    let api = &engine.api;
    engine
        .call(|session| async move { api.reset_cellular_modem(&session, wan.get()).await })
        .await
        .map(|()| {
            info!(%wan, "cellular modem reset requested");
            CommandResult::Ok
        })
}

/// Look a WAN up in the discovered topology.
fn require_wan(engine: &Engine, wan: WanId) -> Result<WanKind, CoreError> {
    engine
        .store
        .topology()
        .wan(wan)
        .map(|d| d.kind)
        .ok_or(CoreError::WanNotFound { wan: wan.get() })
}
