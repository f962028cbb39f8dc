// ── API-to-domain type conversions ──
//
// Bridges raw `peplink_api::models` payloads into canonical
// `crate::model` types. Every conversion is total: a missing or malformed
// optional member becomes `None` (or an empty list) instead of failing
// the whole record.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use peplink_api::models::{
    RawBandwidth, RawCellular, RawDevice, RawLocation, RawSystemInfo, RawUsage, RawVpnProfile,
    RawWanConnection, RawWifi,
};

use crate::model::{
    Bandwidth, CellularInfo, ConnectionStatus, CycleAnchor, DeviceIdentity, FanReading, FanStatus,
    GpsFix, HardwareSensors, LedColor, MAX_SIM_SLOTS, Priority, SimSlot, SimUsage, Topology,
    UsageCounter, VpnProfile, VpnState, WanDescriptor, WanId, WanKind, WanStatus, WanUsage,
    WifiInfo, sim_slot_name,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn to_i32(value: Option<i64>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}

fn to_u64(value: Option<i64>) -> Option<u64> {
    value.and_then(|v| u64::try_from(v).ok())
}

fn to_percent(value: Option<i64>) -> Option<u8> {
    value.map(|v| u8::try_from(v.clamp(0, 255)).unwrap_or(u8::MAX))
}

// ── WAN status ───────────────────────────────────────────────────────

/// Classify a WAN by the blocks it carries, then by its name.
pub fn wan_kind(raw: &RawWanConnection) -> WanKind {
    if raw.cellular.is_some() {
        return WanKind::Cellular;
    }
    if raw.wifi.is_some() {
        return WanKind::Wifi;
    }
    let name = raw.name.as_deref().unwrap_or_default().to_ascii_lowercase();
    if name.contains("vwan") {
        WanKind::VirtualWan
    } else if name.contains("ethernet") {
        WanKind::Ethernet
    } else {
        WanKind::Unknown
    }
}

pub fn wan_status(id: u32, raw: &RawWanConnection) -> WanStatus {
    let kind = wan_kind(raw);
    let enabled = raw.enable.unwrap_or(false);
    let message = raw.message.clone().or_else(|| raw.status.clone());

    let cellular = match kind {
        WanKind::Cellular => raw.cellular_info().map(|c| cellular_info(&c)),
        _ => None,
    };
    let wifi = match kind {
        WanKind::Wifi => raw.wifi_info().map(|w| wifi_info(&w)),
        _ => None,
    };

    WanStatus {
        id: WanId::new(id),
        name: raw.name.clone().unwrap_or_else(|| format!("WAN {id}")),
        kind,
        enabled,
        status: ConnectionStatus::from_message(message.as_deref(), enabled),
        message,
        ip: raw.ip.as_deref().and_then(|ip| ip.parse().ok()),
        uptime: to_u64(raw.uptime).map(Duration::from_secs),
        priority: Priority::from_reported(raw.priority, enabled),
        led: raw.status_led.as_deref().and_then(|c| c.parse::<LedColor>().ok()),
        cellular,
        wifi,
    }
}

fn cellular_info(raw: &RawCellular) -> CellularInfo {
    // First reported signal figure wins; small values are bars, the rest dBm.
    let signal = raw
        .signal_strength
        .or(raw.signal_level)
        .or_else(|| raw.nested_signal_level());
    let (signal_bars, signal_dbm) = match signal {
        Some(level @ 0..=5) => (u8::try_from(level).ok(), None),
        Some(dbm) => (None, i32::try_from(dbm).ok()),
        None => (None, None),
    };

    let mut bands = Vec::new();
    let (mut rssi, mut rsrp, mut rsrq, mut sinr) = (None, None, None, None);
    for band in raw.rat.iter().flat_map(|rat| rat.band.iter()) {
        if let Some(name) = &band.name {
            bands.push(name.clone());
        }
        if let Some(sig) = &band.signal {
            rssi = rssi.or(to_i32(sig.rssi));
            rsrp = rsrp.or(to_i32(sig.rsrp));
            rsrq = rsrq.or(sig.rsrq);
            sinr = sinr.or(sig.sinr);
        }
    }
    if bands.is_empty() {
        bands.extend(raw.band.clone());
    }

    let sim_slots = raw
        .sim_slots()
        .into_iter()
        .filter_map(|(slot, sim)| {
            let slot = u8::try_from(slot).ok().filter(|s| *s <= MAX_SIM_SLOTS)?;
            Some(SimSlot {
                slot,
                name: sim_slot_name(slot),
                detected: sim.detected,
                active: sim.active.or(sim.enable),
                apn: sim.apn,
            })
        })
        .collect();

    CellularInfo {
        module_name: raw
            .module_name
            .clone()
            .unwrap_or_else(|| "Cellular Modem".into()),
        signal_bars,
        signal_dbm,
        signal_quality: to_i32(raw.signal_quality),
        rssi_dbm: rssi,
        rsrp_dbm: rsrp,
        rsrq_db: rsrq,
        sinr_db: sinr,
        carrier: raw.carrier_name(),
        network_type: raw.network_type.clone().or_else(|| raw.mobile_type.clone()),
        bands,
        carrier_aggregation: raw.carrier_aggregation.unwrap_or(false),
        sim_slots,
    }
}

fn wifi_info(raw: &RawWifi) -> WifiInfo {
    WifiInfo {
        ssid: raw.ssid.clone(),
        frequency: raw.frequency.clone(),
        signal_dbm: to_i32(raw.signal_dbm()),
        channel: raw.channel.and_then(|c| u32::try_from(c).ok()),
    }
}

/// Router reports kbps; the domain carries Mbps.
pub fn bandwidth(raw: &RawBandwidth) -> Bandwidth {
    let overall = raw.overall.clone().unwrap_or_default();
    Bandwidth {
        download_mbps: overall.download.unwrap_or(0.0) / 1000.0,
        upload_mbps: overall.upload.unwrap_or(0.0) / 1000.0,
    }
}

// ── Usage ────────────────────────────────────────────────────────────

fn usage_counter(raw: &RawUsage) -> UsageCounter {
    UsageCounter {
        enabled: raw.enable.unwrap_or(false),
        tracked: raw.usage.is_some(),
        used_mb: to_u64(raw.usage),
        limit_mb: to_u64(raw.limit),
        percent: to_percent(raw.percent),
        unit: raw.unit.clone(),
        cycle_start: raw.start.as_deref().and_then(CycleAnchor::parse),
        last_rollover: None,
    }
}

/// Convert one usage entry. Per-SIM records, when present, replace the
/// top-level counters; a WAN without SIM records yields no `sims`.
pub fn wan_usage(id: u32, raw: &RawUsage) -> WanUsage {
    let sims: Vec<SimUsage> = raw
        .sim_slots()
        .iter()
        .filter_map(|(slot, sim)| {
            let slot = u8::try_from(*slot).ok()?;
            Some(SimUsage {
                slot,
                name: sim_slot_name(slot),
                counter: usage_counter(sim),
            })
        })
        .collect();

    let counter = if sims.is_empty() {
        usage_counter(raw)
    } else {
        UsageCounter {
            enabled: raw.enable.unwrap_or(false),
            ..UsageCounter::default()
        }
    };

    WanUsage {
        wan: WanId::new(id),
        counter,
        sims,
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────

pub fn sensors(raw: &RawSystemInfo) -> HardwareSensors {
    let thermal = raw.thermal_sensor.first();
    let fans = raw
        .fan_speed
        .iter()
        .zip(1u8..)
        .map(|(fan, index)| {
            let active = fan.active.unwrap_or(false);
            FanReading {
                index,
                name: format!("Fan {index}"),
                rpm: fan
                    .value
                    .filter(|v| *v > 0)
                    .and_then(|v| u32::try_from(v).ok()),
                percent: to_percent(fan.percentage.filter(|p| *p > 0)),
                status: if active { FanStatus::Normal } else { FanStatus::Off },
            }
        })
        .collect();

    HardwareSensors {
        temperature_c: thermal.and_then(|t| t.temperature),
        temperature_threshold_c: thermal.and_then(|t| t.threshold),
        fans,
    }
}

pub fn device_identity(raw: &RawSystemInfo) -> DeviceIdentity {
    let device: RawDevice = raw.device.clone().unwrap_or_default();
    DeviceIdentity {
        serial_number: device.serial_number,
        model: device.model,
        hardware_revision: device.hardware_revision.or(device.hardware_version),
    }
}

// ── VPN ──────────────────────────────────────────────────────────────

pub fn vpn_profiles(raw: &BTreeMap<String, RawVpnProfile>) -> Vec<VpnProfile> {
    raw.iter()
        .map(|(id, profile)| VpnProfile {
            id: id.clone(),
            name: profile.name.clone().unwrap_or_else(|| id.clone()),
            kind: profile.kind.clone(),
            state: VpnState::from_reported(profile.status.as_deref().unwrap_or("unknown")),
        })
        .collect()
}

// ── Location ─────────────────────────────────────────────────────────

pub fn gps_fix(raw: &RawLocation) -> GpsFix {
    let reported_at: Option<DateTime<Utc>> = raw
        .timestamp
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

    GpsFix {
        latitude: raw.latitude,
        longitude: raw.longitude,
        altitude_m: raw.altitude,
        speed_mps: raw.speed,
        heading_deg: raw.heading,
        accuracy_m: raw.accuracy,
        reported_at,
        stale: !raw.has_fix(),
    }
}

// ── Topology ─────────────────────────────────────────────────────────

pub fn topology(
    statuses: &BTreeMap<u32, RawWanConnection>,
    vpn_profiles: Vec<VpnProfile>,
    now: DateTime<Utc>,
) -> Topology {
    let wans = statuses
        .iter()
        .map(|(id, raw)| {
            let kind = wan_kind(raw);
            let descriptor = WanDescriptor {
                id: WanId::new(*id),
                name: raw.name.clone().unwrap_or_else(|| format!("WAN {id}")),
                kind,
                sim_slots: if kind == WanKind::Cellular { MAX_SIM_SLOTS } else { 0 },
            };
            (descriptor.id, descriptor)
        })
        .collect();

    Topology {
        wans,
        vpn_profiles,
        discovered_at: Some(now),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::de::DeserializeOwned;
    use serde_json::json;

    use super::*;

    fn raw<T: DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn kind_detection() {
        let cell: RawWanConnection = raw(json!({ "name": "Mobile", "cellular": {} }));
        let wifi: RawWanConnection = raw(json!({ "name": "WiFi WAN", "wifi": {} }));
        let vwan: RawWanConnection = raw(json!({ "name": "VWAN 1" }));
        let eth: RawWanConnection = raw(json!({ "name": "Ethernet WAN" }));
        let other: RawWanConnection = raw(json!({ "name": "Starlink" }));
        assert_eq!(wan_kind(&cell), WanKind::Cellular);
        assert_eq!(wan_kind(&wifi), WanKind::Wifi);
        assert_eq!(wan_kind(&vwan), WanKind::VirtualWan);
        assert_eq!(wan_kind(&eth), WanKind::Ethernet);
        assert_eq!(wan_kind(&other), WanKind::Unknown);
    }

    #[test]
    fn wired_wan_has_no_cellular_block() {
        let status = wan_status(
            1,
            &raw(json!({
                "name": "Ethernet WAN",
                "enable": true,
                "message": "Connected",
                "priority": 1,
                "uptime": 3_725,
                "ip": "198.51.100.2",
                "statusLed": "green"
            })),
        );
        assert_eq!(status.status, ConnectionStatus::Connected);
        assert_eq!(status.priority, Priority::Level(1));
        assert_eq!(status.uptime, Some(Duration::from_secs(3_725)));
        assert_eq!(status.led, Some(LedColor::Green));
        assert_eq!(status.ip.unwrap().to_string(), "198.51.100.2");
        assert!(status.cellular.is_none());
    }

    #[test]
    fn cellular_signal_bands_and_sims() {
        let status = wan_status(
            2,
            &raw(json!({
                "name": "Cellular",
                "enable": true,
                "message": "Connected",
                "cellular": {
                    "signal": { "level": 3 },
                    "carrier": "Three",
                    "networkType": "5G",
                    "rat": [
                        { "band": [{ "name": "n78", "signal": { "rsrp": -101, "rsrq": -12, "sinr": 8.5 } }] },
                        { "band": [{ "name": "B1" }] }
                    ],
                    "sim": { "1": { "detected": true, "active": true, "apn": "three.co.uk" }, "2": { "detected": false } }
                }
            })),
        );
        let cell = status.cellular.unwrap();
        assert_eq!(cell.signal_bars, Some(3));
        assert_eq!(cell.signal_dbm, None);
        assert_eq!(cell.rsrp_dbm, Some(-101));
        assert_eq!(cell.rsrq_db, Some(-12.0));
        assert_eq!(cell.bands, vec!["n78".to_owned(), "B1".to_owned()]);
        assert_eq!(cell.carrier.as_deref(), Some("Three"));
        assert_eq!(cell.module_name, "Cellular Modem");
        assert_eq!(cell.sim_slots.len(), 2);
        assert_eq!(cell.sim_slots[0].name, "SIM A");
        assert_eq!(cell.sim_slots[1].detected, Some(false));
    }

    #[test]
    fn raw_dbm_signal_is_not_bars() {
        let status = wan_status(
            3,
            &raw(json!({ "name": "LTE", "enable": true, "cellular": { "signalStrength": -71 } })),
        );
        let cell = status.cellular.unwrap();
        assert_eq!(cell.signal_bars, None);
        assert_eq!(cell.signal_dbm, Some(-71));
    }

    #[test]
    fn single_sim_usage_has_zero_sim_records() {
        let usage = wan_usage(
            2,
            &raw(json!({
                "enable": true, "usage": 2048, "limit": 8192, "unit": "MB", "start": "1"
            })),
        );
        assert!(usage.sims.is_empty());
        assert_eq!(usage.counter.used_mb, Some(2048));
        assert_eq!(usage.counter.percent_used(), Some(25));
        assert_eq!(usage.counter.cycle_start, Some(CycleAnchor::DayOfMonth(1)));
    }

    #[test]
    fn multi_sim_usage_moves_counters_to_slots() {
        let usage = wan_usage(
            2,
            &raw(json!({
                "enable": true,
                "1": { "enable": true, "usage": 100, "limit": 1000, "percent": 10, "start": "5" },
                "2": { "enable": false }
            })),
        );
        assert_eq!(usage.sims.len(), 2);
        assert_eq!(usage.sims[0].name, "SIM A");
        assert_eq!(usage.sims[0].counter.percent, Some(10));
        assert!(!usage.sims[1].counter.tracked);
        assert_eq!(usage.counter.used_mb, None);
    }

    #[test]
    fn fans_and_thermal() {
        let diag = sensors(&raw(json!({
            "thermalSensor": [{ "temperature": "51.0", "threshold": 80 }],
            "fanSpeed": [{ "value": 2900, "percentage": 35, "active": true }, { "value": 0, "active": false }]
        })));
        assert_eq!(diag.temperature_c, Some(51.0));
        assert_eq!(diag.fans[0].rpm, Some(2900));
        assert_eq!(diag.fans[1].rpm, None);
        assert_eq!(diag.fans[1].status, FanStatus::Off);
        assert_eq!(diag.fans[1].name, "Fan 2");
        assert!(!diag.overheating());
    }

    #[test]
    fn device_identity_falls_back_to_hardware_version() {
        let id = device_identity(&raw(json!({
            "device": { "serialNumber": "1111-2222-3333", "model": "MAX BR1 Pro 5G", "hardwareVersion": "2" }
        })));
        assert_eq!(id.hardware_revision.as_deref(), Some("2"));
    }

    #[test]
    fn no_fix_is_stale() {
        let fix = gps_fix(&RawLocation::default());
        assert!(fix.stale);
        assert!(!fix.has_fix());
    }

    #[test]
    fn traffic_is_converted_to_mbps() {
        let bw = bandwidth(&raw(json!({ "overall": { "download": 25_000, "upload": 1_500 } })));
        assert_eq!(bw.download_mbps, 25.0);
        assert_eq!(bw.upload_mbps, 1.5);
    }
}
