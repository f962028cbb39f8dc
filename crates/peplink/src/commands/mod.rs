//! Command dispatch: bridges CLI args -> core Router -> output formatting.

pub mod config_cmd;
pub mod health;
pub mod location;
pub mod status;
pub mod system;
pub mod usage;
pub mod vpn;
pub mod wans;
pub mod watch;

use peplink_config::Config;
use peplink_core::{Cadence, Router, RouterConfig, Snapshot, TickOutcome};

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::Printer;

/// Dispatch a command to its handler.
pub async fn dispatch(
    cmd: Command,
    global: &GlobalOpts,
    cfg: &Config,
    printer: &Printer,
) -> Result<(), CliError> {
    match cmd {
        Command::Config(args) => config_cmd::handle(&args, cfg, printer),
        Command::Watch(args) => watch::handle(&args, global, cfg, printer).await,

        cmd => {
            let (profile, router) = config::resolve_router(global, cfg)?;
            tracing::debug!(%profile, command = ?cmd, "dispatching command");
            let result = match cmd {
                Command::Status => status::handle(router, printer).await,
                Command::Wans(args) => wans::handle(args, router, printer).await,
                Command::Usage => usage::handle(router, printer).await,
                Command::System => system::handle(router, printer).await,
                Command::Vpn => vpn::handle(router, printer).await,
                Command::Location => location::handle(router, printer).await,
                Command::Health => health::handle(router, printer).await,
                // Handled above.
                Command::Config(_) | Command::Watch(_) => Ok(()),
            };
            result.map_err(|e| e.with_profile(&profile))
        }
    }
}

/// Connect once, tick each cadence (enabling it for this run if the
/// profile leaves it off), and return the resulting snapshot. A failed
/// tick is an error: a one-shot run has no earlier data to fall back on.
pub async fn poll(mut router: RouterConfig, cadences: &[Cadence]) -> Result<Snapshot, CliError> {
    for cadence in cadences {
        router.cadences.get_mut(*cadence).enabled = true;
    }
    let wanted = cadences.to_vec();

    let snapshot = Router::oneshot(router, |router| async move {
        for cadence in wanted {
            router.poll_now(cadence).await?;
        }
        Ok(router.snapshot())
    })
    .await?;

    ensure_all(&snapshot, cadences)?;
    Ok(snapshot)
}

/// Fail with the recorded error when a one-shot tick of `cadence` failed.
pub fn ensure_polled(snapshot: &Snapshot, cadence: Cadence) -> Result<(), CliError> {
    let slice = snapshot.slice(cadence);
    if slice.runtime.last_outcome != Some(TickOutcome::Failed) {
        return Ok(());
    }
    match slice.records.values().find_map(|t| t.last_error.as_ref()) {
        Some(error) => Err(CliError::PollFailed {
            cadence: cadence.to_string(),
            kind: error.kind,
            message: error.message.clone(),
        }),
        None => Ok(()),
    }
}

/// `ensure_polled` for several cadences.
pub fn ensure_all(snapshot: &Snapshot, cadences: &[Cadence]) -> Result<(), CliError> {
    cadences
        .iter()
        .try_for_each(|c| ensure_polled(snapshot, *c))
}
