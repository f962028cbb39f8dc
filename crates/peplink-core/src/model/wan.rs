// ── WAN domain types ──

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Highest priority level a WAN can be assigned.
pub const MAX_PRIORITY: u8 = 4;

/// Stable WAN connection id as numbered by the router (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WanId(u32);

impl WanId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WanId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for WanId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|id| *id > 0)
            .map(Self)
            .ok_or_else(|| CoreError::ValidationFailed {
                message: format!("invalid WAN id '{s}'"),
            })
    }
}

/// Physical or logical kind of a WAN link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WanKind {
    Ethernet,
    Cellular,
    Wifi,
    VirtualWan,
    Unknown,
}

/// Connection state derived from the router's status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Standby,
    Disconnected,
    Disabled,
    Unknown,
}

impl ConnectionStatus {
    /// Classify the router's free-text status message.
    pub fn from_message(message: Option<&str>, enabled: bool) -> Self {
        if !enabled {
            return Self::Disabled;
        }
        let Some(message) = message else {
            return Self::Unknown;
        };
        let lower = message.to_ascii_lowercase();
        if lower.contains("disconnect") || lower.contains("no cable") || lower.contains("fail") {
            Self::Disconnected
        } else if lower.contains("standby") || lower.contains("ready") {
            Self::Standby
        } else if lower.contains("connecting")
            || lower.contains("obtaining")
            || lower.contains("initializ")
            || lower.contains("checking")
        {
            Self::Connecting
        } else if lower.contains("connected") {
            Self::Connected
        } else if lower.contains("disabled") {
            Self::Disabled
        } else {
            Self::Unknown
        }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// WAN priority: a level 1..=4, or disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Level(u8),
    Disabled,
}

impl Priority {
    /// Validated constructor for a numeric level.
    pub fn level(level: u8) -> Result<Self, CoreError> {
        if (1..=MAX_PRIORITY).contains(&level) {
            Ok(Self::Level(level))
        } else {
            Err(CoreError::ValidationFailed {
                message: format!("priority must be 1..={MAX_PRIORITY} or disabled, got {level}"),
            })
        }
    }

    /// Level as the router expects it; `None` means disable.
    pub fn as_level(self) -> Option<u8> {
        match self {
            Self::Level(level) => Some(level),
            Self::Disabled => None,
        }
    }

    /// Interpret the router-reported value; missing or out-of-range is disabled.
    pub fn from_reported(value: Option<i64>, enabled: bool) -> Self {
        match value.and_then(|v| u8::try_from(v).ok()) {
            Some(level) if enabled && (1..=MAX_PRIORITY).contains(&level) => Self::Level(level),
            _ => Self::Disabled,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("disabled") || s.eq_ignore_ascii_case("off") {
            return Ok(Self::Disabled);
        }
        let level = s.parse::<u8>().map_err(|_| CoreError::ValidationFailed {
            message: format!("invalid priority '{s}'"),
        })?;
        Self::level(level)
    }
}

/// Colour of the WAN status LED in the router's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LedColor {
    Green,
    Yellow,
    Red,
    Gray,
    Empty,
}

/// Live status of one WAN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WanStatus {
    pub id: WanId,
    pub name: String,
    pub kind: WanKind,
    pub enabled: bool,
    pub status: ConnectionStatus,
    /// Raw router status message ("Connected", "No Cable Detected", ...).
    pub message: Option<String>,
    pub ip: Option<IpAddr>,
    pub uptime: Option<Duration>,
    pub priority: Priority,
    pub led: Option<LedColor>,
    pub cellular: Option<CellularInfo>,
    pub wifi: Option<WifiInfo>,
}

/// Radio details of a cellular WAN.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellularInfo {
    pub module_name: String,
    /// Signal bars 0..=5.
    pub signal_bars: Option<u8>,
    /// Signal strength in dBm when the router reports one instead of bars.
    pub signal_dbm: Option<i32>,
    pub signal_quality: Option<i32>,
    pub rssi_dbm: Option<i32>,
    pub rsrp_dbm: Option<i32>,
    pub rsrq_db: Option<f64>,
    pub sinr_db: Option<f64>,
    pub carrier: Option<String>,
    pub network_type: Option<String>,
    pub bands: Vec<String>,
    pub carrier_aggregation: bool,
    pub sim_slots: Vec<SimSlot>,
}

/// A physical or virtual SIM slot on a cellular module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimSlot {
    pub slot: u8,
    pub name: String,
    pub detected: Option<bool>,
    pub active: Option<bool>,
    pub apn: Option<String>,
}

/// Details of a Wi-Fi-as-WAN link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WifiInfo {
    pub ssid: Option<String>,
    pub frequency: Option<String>,
    pub signal_dbm: Option<i32>,
    pub channel: Option<u32>,
}

/// Live throughput of one WAN in Mbps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bandwidth {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}
