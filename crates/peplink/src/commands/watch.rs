//! `peplink watch`: keep routers connected and reprint their state.
//!
//! Unlike the one-shot commands this runs the background schedulers, so
//! each refresh shows whatever the cadences have gathered so far.

use serde::Serialize;
use tabled::Tabled;
use tokio::time::{Instant, interval_at};
use tracing::warn;

use peplink_config::Config;
use peplink_core::{Fleet, HealthState, Router, RouterConfig, WanView};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output::Printer;

use super::{health, status};

// ── Frames ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RouterFrame<'a> {
    profile: &'a str,
    health: &'a HealthState,
    wans: Vec<WanView<'a>>,
}

#[derive(Serialize)]
struct FleetEntry {
    profile: String,
    health: HealthState,
    wans_up: usize,
    wans_total: usize,
}

#[derive(Tabled)]
struct FleetRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "WANs up")]
    wans: String,
}

fn render_router(profile: &str, router: &Router, printer: &Printer) -> Result<String, CliError> {
    let snapshot = router.snapshot();
    let health = router.health();
    if printer.format != OutputFormat::Table {
        let frame = RouterFrame {
            profile,
            health: &health,
            wans: snapshot.wans(),
        };
        return printer.single(&frame, String::new);
    }
    let table = status::render(&snapshot, printer)?;
    Ok(format!(
        "{}  {}\n{table}",
        printer.dim(&snapshot.taken_at.format("%H:%M:%S").to_string()),
        health::summary(&health, printer),
    ))
}

fn render_fleet(fleet: &Fleet, printer: &Printer) -> Result<String, CliError> {
    let entries: Vec<FleetEntry> = fleet
        .health()
        .into_iter()
        .map(|(profile, health)| {
            let (wans_up, wans_total) = fleet.get(&profile).map_or((0, 0), |router| {
                let snapshot = router.snapshot();
                let wans = snapshot.wans();
                let up = wans
                    .iter()
                    .filter(|w| w.status.is_some_and(|s| s.status.is_up()))
                    .count();
                (up, wans.len())
            });
            FleetEntry {
                profile,
                health: health.as_ref().clone(),
                wans_up,
                wans_total,
            }
        })
        .collect();

    printer.list(&entries, || {
        entries
            .iter()
            .map(|e| FleetRow {
                profile: e.profile.clone(),
                health: health::summary(&e.health, printer),
                wans: format!("{}/{}", e.wans_up, e.wans_total),
            })
            .collect()
    })
}

// ── Refresh loop ────────────────────────────────────────────────────

/// Print `render()` every `args.interval` until Ctrl-C or `args.count`
/// refreshes.
async fn refresh<F>(args: &WatchArgs, printer: &Printer, mut render: F) -> Result<(), CliError>
where
    F: FnMut() -> Result<String, CliError>,
{
    let mut ticker = interval_at(Instant::now() + args.interval, args.interval);
    let mut printed: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                printer.print(&render()?);
                printed += 1;
                if args.count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: &WatchArgs,
    global: &GlobalOpts,
    cfg: &Config,
    printer: &Printer,
) -> Result<(), CliError> {
    if args.all {
        watch_fleet(args, config::resolve_all(global, cfg)?, printer).await
    } else {
        let (profile, router) = config::resolve_router(global, cfg)?;
        watch_one(args, &profile, router, printer)
            .await
            .map_err(|e| e.with_profile(&profile))
    }
}

async fn watch_one(
    args: &WatchArgs,
    profile: &str,
    mut config: RouterConfig,
    printer: &Printer,
) -> Result<(), CliError> {
    config.polling_enabled = true;
    let router = Router::new(config)?;
    if let Err(e) = router.connect().await {
        router.shutdown().await;
        return Err(e.into());
    }

    let result = refresh(args, printer, || render_router(profile, &router, printer)).await;
    router.shutdown().await;
    result
}

async fn watch_fleet(
    args: &WatchArgs,
    routers: Vec<(String, RouterConfig)>,
    printer: &Printer,
) -> Result<(), CliError> {
    let fleet = Fleet::new();
    for (name, mut config) in routers {
        config.polling_enabled = true;
        let router = match Router::new(config) {
            Ok(router) => router,
            Err(e) => {
                fleet.shutdown_all().await;
                return Err(e.into());
            }
        };
        // A router that fails to connect stays in the fleet as unhealthy.
        if let Err(e) = router.connect().await {
            warn!(router = %name, error = %e, "connect failed");
        }
        fleet.insert(name, router).await;
    }

    let result = refresh(args, printer, || render_fleet(&fleet, printer)).await;
    fleet.shutdown_all().await;
    result
}
