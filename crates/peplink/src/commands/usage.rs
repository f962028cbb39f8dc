//! `peplink usage`: bandwidth allowance per WAN and SIM.

use tabled::Tabled;

use peplink_core::model::UsageCounter;
use peplink_core::model::format::{format_cycle_start, format_usage_gb};
use peplink_core::{Cadence, RouterConfig, WanUsage};

use crate::error::CliError;
use crate::output::{self, Printer};

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "WAN")]
    wan: String,
    #[tabled(rename = "SIM")]
    sim: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "%")]
    percent: String,
    #[tabled(rename = "Cycle start")]
    cycle: String,
    #[tabled(rename = "Last rollover")]
    rollover: String,
}

impl UsageRow {
    fn new(wan: String, sim: String, counter: &UsageCounter, printer: &Printer) -> Self {
        let percent = counter.percent_used().map_or_else(output::dash, |p| {
            let text = format!("{p}%");
            match p {
                0..=79 => text,
                80..=99 => printer.warn(&text),
                _ => printer.bad(&text),
            }
        });
        Self {
            wan,
            sim,
            used: if counter.tracked {
                format_usage_gb(counter.used_mb)
            } else {
                output::dash()
            },
            limit: counter
                .limit_mb
                .map_or_else(output::dash, |mb| format_usage_gb(Some(mb))),
            percent,
            cycle: format_cycle_start(counter.cycle_start),
            rollover: counter
                .last_rollover
                .map_or_else(output::dash, |at| at.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

fn rows(usage: &WanUsage, printer: &Printer) -> Vec<UsageRow> {
    let wan = usage.wan.to_string();
    if usage.sims.is_empty() {
        return vec![UsageRow::new(wan, output::dash(), &usage.counter, printer)];
    }
    usage
        .sims
        .iter()
        .map(|sim| UsageRow::new(wan.clone(), sim.name.clone(), &sim.counter, printer))
        .collect()
}

pub async fn handle(router: RouterConfig, printer: &Printer) -> Result<(), CliError> {
    let snapshot = super::poll(router, &[Cadence::Usage]).await?;
    let usage: Vec<&WanUsage> = snapshot.wans().iter().filter_map(|w| w.usage).collect();
    let out = printer.list(&usage, || {
        usage
            .iter()
            .filter(|u| u.counter.enabled || !u.sims.is_empty())
            .flat_map(|u| rows(u, printer))
            .collect()
    })?;
    printer.print(&out);
    Ok(())
}
