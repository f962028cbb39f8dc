//! `peplink status`: every WAN with live status, throughput and usage.

use tabled::Tabled;

use peplink_core::model::format::format_signal;
use peplink_core::{Cadence, ConnectionStatus, RouterConfig, Snapshot, WanView};

use crate::error::CliError;
use crate::output::{self, Printer};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
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
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Down Mbps")]
    down: String,
    #[tabled(rename = "Up Mbps")]
    up: String,
    #[tabled(rename = "Usage")]
    usage: String,
}

impl StatusRow {
    fn new(wan: &WanView<'_>, printer: &Printer) -> Self {
        Self {
            id: wan.id.to_string(),
            name: wan.name.clone(),
            kind: wan.kind.to_string(),
            status: wan
                .status
                .map_or_else(output::dash, |s| status_label(s.status, printer)),
            priority: wan
                .status
                .map_or_else(output::dash, |s| s.priority.to_string()),
            signal: wan
                .status
                .and_then(|s| s.cellular.as_ref())
                .and_then(format_signal)
                .unwrap_or_else(output::dash),
            down: wan
                .bandwidth
                .map_or_else(output::dash, |b| format!("{:.1}", b.download_mbps)),
            up: wan
                .bandwidth
                .map_or_else(output::dash, |b| format!("{:.1}", b.upload_mbps)),
            usage: usage_label(wan),
        }
    }
}

/// Connection status, coloured by severity.
pub fn status_label(status: ConnectionStatus, printer: &Printer) -> String {
    let label = status.to_string();
    match status {
        ConnectionStatus::Connected => printer.good(&label),
        ConnectionStatus::Connecting | ConnectionStatus::Standby => printer.warn(&label),
        ConnectionStatus::Disconnected => printer.bad(&label),
        ConnectionStatus::Disabled | ConnectionStatus::Unknown => printer.dim(&label),
    }
}

fn usage_label(wan: &WanView<'_>) -> String {
    let Some(usage) = wan.usage else {
        return output::dash();
    };
    if usage.sims.is_empty() {
        return usage
            .counter
            .percent_used()
            .map_or_else(output::dash, |p| format!("{p}%"));
    }
    usage
        .sims
        .iter()
        .filter_map(|sim| {
            sim.counter
                .percent_used()
                .map(|p| format!("{} {p}%", sim.name))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Handler ─────────────────────────────────────────────────────────

const CADENCES: &[Cadence] = &[Cadence::Status, Cadence::Diagnostics, Cadence::Usage];

pub async fn handle(router: RouterConfig, printer: &Printer) -> Result<(), CliError> {
    let snapshot = super::poll(router, CADENCES).await?;
    printer.print(&render(&snapshot, printer)?);
    Ok(())
}

pub fn render(snapshot: &Snapshot, printer: &Printer) -> Result<String, CliError> {
    let wans = snapshot.wans();
    printer.list(&wans, || {
        wans.iter().map(|w| StatusRow::new(w, printer)).collect()
    })
}
