// ── Hardware diagnostics types ──

use serde::Serialize;
use strum::Display;

/// Thermal and fan readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HardwareSensors {
    pub temperature_c: Option<f64>,
    pub temperature_threshold_c: Option<f64>,
    pub fans: Vec<FanReading>,
}

impl HardwareSensors {
    /// Temperature at or above the router's own alarm threshold.
    pub fn overheating(&self) -> bool {
        matches!(
            (self.temperature_c, self.temperature_threshold_c),
            (Some(t), Some(limit)) if t >= limit
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanReading {
    /// 1-based fan index.
    pub index: u8,
    pub name: String,
    pub rpm: Option<u32>,
    pub percent: Option<u8>,
    pub status: FanStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FanStatus {
    Normal,
    Off,
}

/// Hardware identity of the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub hardware_revision: Option<String>,
}
