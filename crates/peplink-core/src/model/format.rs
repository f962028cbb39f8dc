// ── Display helpers ──
//
// Pure formatting used by consumers of the read model. Nothing here
// touches the network or the snapshot.

use std::time::Duration;

use super::usage::CycleAnchor;
use super::wan::CellularInfo;

/// Uptime as `D:HH:MM`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{days}:{hours:02}:{minutes:02}")
}

/// Signal as `N/5` when the router reports bars, `N dBm` otherwise.
pub fn format_signal(cellular: &CellularInfo) -> Option<String> {
    match (cellular.signal_bars, cellular.best_dbm()) {
        (Some(bars), _) => Some(format!("{bars}/5")),
        (None, Some(dbm)) => Some(format!("{dbm} dBm")),
        (None, None) => None,
    }
}

/// Megabytes as `N.NN GB`.
pub fn format_usage_gb(mb: Option<u64>) -> String {
    match mb {
        Some(mb) => format!("{:.2} GB", mb as f64 / 1024.0),
        None => "0 GB".into(),
    }
}

/// Day of month as an English ordinal (`1st`, `12th`, `22nd`).
pub fn ordinal(day: u8) -> String {
    let suffix = match (day % 100, day % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Billing cycle start for display.
pub fn format_cycle_start(anchor: Option<CycleAnchor>) -> String {
    match anchor {
        Some(CycleAnchor::DayOfMonth(day)) => ordinal(day),
        Some(CycleAnchor::Date(date)) => date.format("%Y-%m-%d").to_string(),
        None => "unknown".into(),
    }
}

impl CellularInfo {
    /// Best available dBm figure: reported strength, else RSRP, else RSSI.
    pub fn best_dbm(&self) -> Option<i32> {
        self.signal_dbm.or(self.rsrp_dbm).or(self.rssi_dbm)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1:01:01");
        assert_eq!(format_uptime(Duration::from_secs(3 * 86_400 + 59)), "3:00:00");
    }

    #[test]
    fn signal_format() {
        let bars = CellularInfo {
            signal_bars: Some(4),
            ..CellularInfo::default()
        };
        let dbm = CellularInfo {
            rsrp_dbm: Some(-97),
            ..CellularInfo::default()
        };
        assert_eq!(format_signal(&bars).as_deref(), Some("4/5"));
        assert_eq!(format_signal(&dbm).as_deref(), Some("-97 dBm"));
        assert_eq!(format_signal(&CellularInfo::default()), None);
    }

    #[test]
    fn ordinals() {
        let rendered: Vec<_> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 31]
            .into_iter()
            .map(ordinal)
            .collect();
        assert_eq!(
            rendered,
            ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd", "31st"]
        );
    }

    #[test]
    fn usage_and_cycle_format() {
        assert_eq!(format_usage_gb(Some(1536)), "1.50 GB");
        assert_eq!(format_usage_gb(None), "0 GB");
        assert_eq!(
            format_cycle_start(Some(CycleAnchor::DayOfMonth(2))),
            "2nd"
        );
        assert_eq!(
            format_cycle_start(NaiveDate::from_ymd_opt(2024, 3, 1).map(CycleAnchor::Date)),
            "2024-03-01"
        );
    }
}
