// ── PepVPN / SpeedFusion profile types ──

use serde::Serialize;

/// Tunnel state of one PepVPN profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VpnState {
    Connected,
    Connecting,
    Disconnected,
    /// Anything the router reports that we do not recognise.
    Other(String),
}

impl VpnState {
    pub fn from_reported(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "connected" | "up" | "established" => Self::Connected,
            "connecting" | "starting" | "negotiating" | "authenticating" => Self::Connecting,
            "disconnected" | "down" | "stopped" | "disabled" => Self::Disconnected,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Disconnected => "disconnected",
            Self::Other(raw) => raw,
        }
    }
}

/// One configured PepVPN profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpnProfile {
    pub id: String,
    pub name: String,
    pub kind: Option<String>,
    pub state: VpnState,
}
