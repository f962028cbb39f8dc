// ── GPS fix ──

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Last position reported by the router's GPS receiver.
///
/// A router that is polled but has no fix yields a record with no
/// coordinates and `stale` set, rather than no record at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GpsFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Metres above sea level.
    pub altitude_m: Option<f64>,
    /// Metres per second.
    pub speed_mps: Option<f64>,
    /// Degrees clockwise from north.
    pub heading_deg: Option<f64>,
    /// Horizontal accuracy in metres.
    pub accuracy_m: Option<f64>,
    pub reported_at: Option<DateTime<Utc>>,
    pub stale: bool,
}

impl GpsFix {
    pub fn has_fix(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
