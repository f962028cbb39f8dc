//! `peplink system`: device identity, firmware, clients and sensors.

use std::fmt::Write as _;

use serde::Serialize;

use peplink_core::{Cadence, DeviceIdentity, HardwareSensors, RouterConfig, Snapshot};

use crate::error::CliError;
use crate::output::Printer;

#[derive(Debug, Serialize)]
struct SystemView<'a> {
    device: Option<&'a DeviceIdentity>,
    firmware: Option<&'a str>,
    connected_clients: Option<usize>,
    sensors: Option<&'a HardwareSensors>,
}

impl<'a> SystemView<'a> {
    fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        Self {
            device: snapshot.device(),
            firmware: snapshot.firmware(),
            connected_clients: snapshot.connected_clients(),
            sensors: snapshot.sensors(),
        }
    }
}

fn field(out: &mut String, label: &str, value: Option<&str>) {
    let _ = writeln!(out, "{label:<14}{}", value.unwrap_or("-"));
}

fn detail(view: &SystemView<'_>, printer: &Printer) -> String {
    let mut out = String::new();
    let device = view.device;
    field(&mut out, "Model", device.and_then(|d| d.model.as_deref()));
    field(&mut out, "Serial", device.and_then(|d| d.serial_number.as_deref()));
    field(&mut out, "Hardware", device.and_then(|d| d.hardware_revision.as_deref()));
    field(&mut out, "Firmware", view.firmware);
    field(
        &mut out,
        "Clients",
        view.connected_clients.map(|n| n.to_string()).as_deref(),
    );

    if let Some(sensors) = view.sensors {
        let temperature = sensors.temperature_c.map(|t| {
            let text = match sensors.temperature_threshold_c {
                Some(limit) => format!("{t:.1} °C (limit {limit:.0} °C)"),
                None => format!("{t:.1} °C"),
            };
            if sensors.overheating() {
                printer.bad(&text)
            } else {
                text
            }
        });
        field(&mut out, "Temperature", temperature.as_deref());
        for fan in &sensors.fans {
            let speed = match (fan.rpm, fan.percent) {
                (Some(rpm), Some(pct)) => format!("{rpm} rpm ({pct}%), {}", fan.status),
                (Some(rpm), None) => format!("{rpm} rpm, {}", fan.status),
                (None, Some(pct)) => format!("{pct}%, {}", fan.status),
                (None, None) => fan.status.to_string(),
            };
            field(&mut out, &fan.name, Some(&speed));
        }
    }
    out.trim_end().to_owned()
}

pub async fn handle(router: RouterConfig, printer: &Printer) -> Result<(), CliError> {
    let snapshot = super::poll(router, &[Cadence::Diagnostics]).await?;
    let view = SystemView::from_snapshot(&snapshot);
    let out = printer.single(&view, || detail(&view, printer))?;
    printer.print(&out);
    Ok(())
}
