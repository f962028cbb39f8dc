// Router API response types
//
// Raw wire shapes as the router emits them. Firmware versions disagree on
// whether numbers arrive as numbers or strings and on which optional
// members exist, so every field is optional and decoded leniently. The
// conversion into domain types lives in peplink-core.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Lenient field decoders for `#[serde(deserialize_with = ...)]`.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Integer from a number or a numeric string.
    pub fn as_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.round() as i64)
                })
            }
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Finite float from a number or a numeric string. NaN and infinities
    /// decode as absent.
    pub fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite())
    }

    /// Non-empty string, stringifying bare numbers.
    pub fn as_string(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Truthiness the way the router encodes it: `true`, non-zero, `"yes"`.
    pub fn as_bool(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(as_i64))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(as_f64))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(as_string))
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(as_bool))
    }

    /// A list that may arrive as `null` or as a non-array.
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// Decode every object member whose key is an integer id.
///
/// The router mixes id-keyed records with bookkeeping members such as
/// `"order": [1, 2]`; those are skipped.
pub fn numbered<T: DeserializeOwned>(
    map: &Map<String, Value>,
) -> Result<BTreeMap<u32, T>, serde_json::Error> {
    map.iter()
        .filter_map(|(key, value)| {
            let id = key.trim().parse::<u32>().ok()?;
            value.is_object().then_some((id, value))
        })
        .map(|(id, value)| T::deserialize(value).map(|record| (id, record)))
        .collect()
}

// ── WAN status ───────────────────────────────────────────────────────

/// One entry of `/api/status.wan.connection`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawWanConnection {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub enable: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub priority: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub uptime: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub ip: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub status_led: Option<String>,
    pub cellular: Option<Value>,
    pub wifi: Option<Value>,
}

impl RawWanConnection {
    /// Cellular block, when present and shaped as an object.
    pub fn cellular_info(&self) -> Option<RawCellular> {
        self.cellular
            .as_ref()
            .filter(|v| v.is_object())
            .and_then(|v| RawCellular::deserialize(v).ok())
    }

    /// Wi-Fi block, when present and shaped as an object.
    pub fn wifi_info(&self) -> Option<RawWifi> {
        self.wifi
            .as_ref()
            .filter(|v| v.is_object())
            .and_then(|v| RawWifi::deserialize(v).ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCellular {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub module_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub signal_strength: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub signal_level: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub signal_quality: Option<i64>,
    pub signal: Option<Value>,
    pub carrier: Option<Value>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub network_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub mobile_type: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub band: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub carrier_aggregation: Option<bool>,
    #[serde(deserialize_with = "lenient::list")]
    pub rat: Vec<RawRat>,
    pub sim: Option<Value>,
}

impl RawCellular {
    /// `signal.level` from the nested signal object.
    pub fn nested_signal_level(&self) -> Option<i64> {
        self.signal
            .as_ref()
            .and_then(|s| s.get("level"))
            .and_then(lenient::as_i64)
    }

    /// Per-slot SIM records from the `sim` object, keyed by slot number.
    pub fn sim_slots(&self) -> BTreeMap<u32, RawSim> {
        self.sim
            .as_ref()
            .and_then(Value::as_object)
            .and_then(|sims| numbered(sims).ok())
            .unwrap_or_default()
    }

    /// Carrier name from either `{"name": ...}` or a plain string.
    pub fn carrier_name(&self) -> Option<String> {
        match self.carrier.as_ref()? {
            Value::Object(obj) => obj.get("name").and_then(lenient::as_string),
            other => lenient::as_string(other),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSim {
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub detected: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub active: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub enable: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub apn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRat {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub band: Vec<RawBand>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBand {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    pub signal: Option<RawBandSignal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBandSignal {
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub rssi: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub rsrp: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub rsrq: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub sinr: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawWifi {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub ssid: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub frequency: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub signal_strength: Option<i64>,
    pub signal: Option<Value>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub channel: Option<i64>,
}

impl RawWifi {
    /// Signal in dBm from `signalStrength`, else `signal.level`.
    pub fn signal_dbm(&self) -> Option<i64> {
        self.signal_strength.or_else(|| {
            self.signal
                .as_ref()
                .and_then(|s| s.get("level"))
                .and_then(lenient::as_i64)
        })
    }
}

// ── Usage allowance ──────────────────────────────────────────────────

/// One entry of `/api/status.wan.connection.allowance`.
///
/// Multi-SIM modems nest one record per SIM slot under integer keys;
/// those land in `slots`. Single-SIM and wired WANs carry their counters
/// at the top level.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUsage {
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub enable: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub usage: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub limit: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub percent: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub unit: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub start: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RawUsage {
    /// Per-SIM records, keyed by slot number. Empty for single-SIM WANs.
    pub fn sim_slots(&self) -> BTreeMap<u32, RawUsage> {
        self.rest
            .iter()
            .filter_map(|(key, value)| {
                let slot = key.trim().parse::<u32>().ok()?;
                let record = RawUsage::deserialize(value).ok()?;
                value.is_object().then_some((slot, record))
            })
            .collect()
    }
}

// ── System ───────────────────────────────────────────────────────────

/// One entry of `/api/info.firmware`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFirmware {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub version: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub in_use: Option<bool>,
}

/// `/api/status.client`; only the list length is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawClientList {
    #[serde(deserialize_with = "lenient::list")]
    pub list: Vec<Value>,
}

/// `status.system.info` from the `cgi-bin` API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSystemInfo {
    #[serde(deserialize_with = "lenient::list")]
    pub thermal_sensor: Vec<RawThermalSensor>,
    #[serde(deserialize_with = "lenient::list")]
    pub fan_speed: Vec<RawFan>,
    pub device: Option<RawDevice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawThermalSensor {
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub temperature: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFan {
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub value: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub percentage: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawDevice {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub serial_number: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub hardware_revision: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub hardware_version: Option<String>,
}

/// `status.traffic` from the `cgi-bin` API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTraffic {
    pub bandwidth: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBandwidth {
    pub overall: Option<RawRate>,
}

/// Rates in kbps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRate {
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub download: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub upload: Option<f64>,
}

// ── PepVPN ───────────────────────────────────────────────────────────

/// `/api/status.pepvpn`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPepVpn {
    pub profile: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVpnProfile {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient::opt_string")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
}

// ── Location ─────────────────────────────────────────────────────────

/// GPS position from `/api/info.location`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLocation {
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub altitude: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub speed: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub heading: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub accuracy: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub timestamp: Option<i64>,
}

impl RawLocation {
    /// Both coordinates present.
    pub fn has_fix(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn numbered_skips_bookkeeping_members() {
        let body = json!({
            "1": { "name": "WAN 1", "enable": true },
            "2": { "name": "Cellular", "enable": "yes" },
            "order": [1, 2]
        });
        let wans: BTreeMap<u32, RawWanConnection> = numbered(body.as_object().unwrap()).unwrap();
        assert_eq!(wans.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(wans[&2].enable, Some(true));
    }

    #[test]
    fn numbers_may_arrive_as_strings() {
        let conn: RawWanConnection =
            serde_json::from_value(json!({ "priority": "2", "uptime": 3600.0 })).unwrap();
        assert_eq!(conn.priority, Some(2));
        assert_eq!(conn.uptime, Some(3600));
    }

    #[test]
    fn nan_coordinates_are_absent() {
        let loc: RawLocation =
            serde_json::from_value(json!({ "latitude": "NaN", "longitude": 4.5 })).unwrap();
        assert_eq!(loc.latitude, None);
        assert!(!loc.has_fix());
    }

    #[test]
    fn carrier_accepts_object_or_string() {
        let a: RawCellular = serde_json::from_value(json!({ "carrier": { "name": "Vodafone" } })).unwrap();
        let b: RawCellular = serde_json::from_value(json!({ "carrier": "EE" })).unwrap();
        assert_eq!(a.carrier_name().as_deref(), Some("Vodafone"));
        assert_eq!(b.carrier_name().as_deref(), Some("EE"));
    }

    #[test]
    fn usage_separates_sim_slots() {
        let usage: RawUsage = serde_json::from_value(json!({
            "enable": true,
            "1": { "enable": true, "usage": 1024, "limit": 10240, "percent": 10, "start": "1" },
            "2": { "enable": false }
        }))
        .unwrap();
        let slots = usage.sim_slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[&1].usage, Some(1024));
        assert_eq!(usage.usage, None);
    }

    #[test]
    fn single_sim_usage_has_no_slots() {
        let usage: RawUsage = serde_json::from_value(json!({
            "enable": true, "usage": 300, "limit": 1000, "percent": 30, "unit": "MB", "start": 15
        }))
        .unwrap();
        assert!(usage.sim_slots().is_empty());
        assert_eq!(usage.start.as_deref(), Some("15"));
    }
}
