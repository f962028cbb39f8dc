//! WAN command handlers.

use tabled::Tabled;

use peplink_core::model::format::{format_signal, format_uptime};
use peplink_core::{Cadence, Router, RouterConfig, WanDescriptor, WanStatus};

use crate::cli::{WansArgs, WansCommand};
use crate::error::CliError;
use crate::output::{self, Printer};

use super::status::status_label;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct WanRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Carrier")]
    carrier: String,
}

impl WanRow {
    fn new(w: &WanStatus, printer: &Printer) -> Self {
        let cellular = w.cellular.as_ref();
        Self {
            id: w.id.to_string(),
            name: w.name.clone(),
            kind: w.kind.to_string(),
            status: status_label(w.status, printer),
            priority: w.priority.to_string(),
            ip: w.ip.map_or_else(output::dash, |ip| ip.to_string()),
            uptime: w.uptime.map_or_else(output::dash, format_uptime),
            signal: cellular
                .and_then(format_signal)
                .or_else(|| {
                    w.wifi
                        .as_ref()
                        .and_then(|wifi| wifi.signal_dbm)
                        .map(|dbm| format!("{dbm} dBm"))
                })
                .unwrap_or_else(output::dash),
            carrier: cellular
                .and_then(|c| c.carrier.clone())
                .or_else(|| w.wifi.as_ref().and_then(|wifi| wifi.ssid.clone()))
                .unwrap_or_else(output::dash),
        }
    }
}

#[derive(Tabled)]
struct TopologyRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "SIM slots")]
    sim_slots: String,
}

impl From<&WanDescriptor> for TopologyRow {
    fn from(d: &WanDescriptor) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            kind: d.kind.to_string(),
            sim_slots: if d.sim_slots == 0 {
                output::dash()
            } else {
                d.sim_slots.to_string()
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: WansArgs,
    router: RouterConfig,
    printer: &Printer,
) -> Result<(), CliError> {
    match args.command {
        WansCommand::List => {
            let snapshot = super::poll(router, &[Cadence::Status]).await?;
            let wans: Vec<&WanStatus> = snapshot
                .wan_statuses()
                .map(|m| m.values().collect())
                .unwrap_or_default();
            let out = printer.list(&wans, || {
                wans.iter().map(|w| WanRow::new(w, printer)).collect()
            })?;
            printer.print(&out);
            Ok(())
        }

        WansCommand::SetPriority { wan, priority } => {
            Router::oneshot(router, |r| async move { r.set_priority(wan, priority).await }).await?;
            if !printer.quiet {
                eprintln!("WAN {wan} priority set to {priority}");
            }
            Ok(())
        }

        WansCommand::ResetModem { wan } => {
            Router::oneshot(router, |r| async move { r.reset_modem(wan).await }).await?;
            if !printer.quiet {
                eprintln!("WAN {wan} modem reset requested");
            }
            Ok(())
        }

        WansCommand::Rediscover => {
            let topology =
                Router::oneshot(router, |r| async move { r.rediscover_hardware().await }).await?;
            let out = printer.list(topology.as_ref(), || {
                topology.wans.values().map(TopologyRow::from).collect()
            })?;
            printer.print(&out);
            Ok(())
        }
    }
}
