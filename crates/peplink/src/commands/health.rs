//! `peplink health`: connectivity and data freshness flags.

use std::fmt::Write as _;

use peplink_core::{Cadence, HealthState, Router, RouterConfig};

use crate::error::CliError;
use crate::output::Printer;

fn flag(ok: bool, yes: &str, no: &str, printer: &Printer) -> String {
    if ok { printer.good(yes) } else { printer.bad(no) }
}

fn cadences(list: &[Cadence]) -> String {
    list.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn detail(health: &HealthState, printer: &Printer) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "API        {}",
        flag(health.api_reachable, "reachable", "unreachable", printer)
    );
    let _ = writeln!(
        out,
        "Auth       {}",
        flag(health.authenticated, "ok", "rejected", printer)
    );
    let _ = writeln!(
        out,
        "Data       {}",
        flag(health.data_healthy, "fresh", "stale", printer)
    );
    if !health.stale.is_empty() {
        let _ = writeln!(out, "Stale      {}", printer.warn(&cadences(&health.stale)));
    }
    if !health.failing.is_empty() {
        let _ = writeln!(out, "Failing    {}", printer.bad(&cadences(&health.failing)));
    }
    let _ = write!(
        out,
        "{}",
        printer.dim(&format!(
            "Evaluated  {}",
            health.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ))
    );
    out
}

/// One-line form for `watch`.
pub fn summary(health: &HealthState, printer: &Printer) -> String {
    if health.is_ok() {
        return printer.good("healthy");
    }
    let mut problems = Vec::new();
    if !health.api_reachable {
        problems.push("unreachable".to_owned());
    }
    if !health.authenticated {
        problems.push("auth rejected".to_owned());
    }
    if !health.failing.is_empty() {
        problems.push(format!("failing: {}", cadences(&health.failing)));
    }
    if !health.stale.is_empty() {
        problems.push(format!("stale: {}", cadences(&health.stale)));
    }
    printer.bad(&problems.join("; "))
}

/// Report health even when the router cannot be reached; the connect
/// error is returned after printing so the exit code reflects it.
pub async fn handle(mut router: RouterConfig, printer: &Printer) -> Result<(), CliError> {
    router.polling_enabled = false;
    let engine = Router::new(router)?;

    let connected = engine.connect().await;
    let polled = match connected {
        Ok(()) => engine.poll_all().await.map(|_| ()),
        Err(e) => Err(e),
    };
    let health = engine.health();
    engine.shutdown().await;

    let out = printer.single(health.as_ref(), || detail(&health, printer))?;
    printer.print(&out);
    polled.map_err(CliError::from)
}
