//! `peplink location`: last GPS fix.

use std::fmt::Write as _;

use peplink_core::{Cadence, GpsFix, RouterConfig};

use crate::error::CliError;
use crate::output::Printer;

fn detail(fix: Option<&GpsFix>, printer: &Printer) -> String {
    let Some(fix) = fix.filter(|f| f.has_fix()) else {
        return printer.dim("No GPS fix");
    };
    let mut out = String::new();
    let mut line = |label: &str, value: Option<String>| {
        let _ = writeln!(out, "{label:<10}{}", value.as_deref().unwrap_or("-"));
    };
    line("Latitude", fix.latitude.map(|v| format!("{v:.6}")));
    line("Longitude", fix.longitude.map(|v| format!("{v:.6}")));
    line("Altitude", fix.altitude_m.map(|v| format!("{v:.0} m")));
    line("Speed", fix.speed_mps.map(|v| format!("{:.1} km/h", v * 3.6)));
    line("Heading", fix.heading_deg.map(|v| format!("{v:.0}°")));
    line("Accuracy", fix.accuracy_m.map(|v| format!("±{v:.0} m")));
    line(
        "Reported",
        fix.reported_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    );
    if fix.stale {
        let _ = writeln!(out, "{}", printer.warn("Fix is stale"));
    }
    out.trim_end().to_owned()
}

pub async fn handle(router: RouterConfig, printer: &Printer) -> Result<(), CliError> {
    let snapshot = super::poll(router, &[Cadence::Gps]).await?;
    let fix = snapshot.location();
    let out = printer.single(&fix, || detail(fix, printer))?;
    printer.print(&out);
    Ok(())
}
