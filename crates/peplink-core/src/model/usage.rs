// ── Bandwidth allowance (usage) types ──
//
// Counters are whatever the router last reported for the current billing
// cycle. A change of cycle anchor is a rollover: the new values replace
// the old ones outright and `last_rollover` records when it was seen.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::wan::WanId;

/// Start of the billing cycle as reported by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleAnchor {
    /// Cycle restarts on this day of every month.
    DayOfMonth(u8),
    /// Cycle started on this date.
    Date(NaiveDate),
}

impl CycleAnchor {
    /// Parse `"15"` or `"2024-03-01"`; anything else is unknown.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(day) = raw.parse::<u8>() {
            return (1..=31).contains(&day).then_some(Self::DayOfMonth(day));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                raw.get(..10)
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            })
            .map(Self::Date)
    }
}

/// One allowance counter (a WAN, or one SIM on a multi-SIM modem).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageCounter {
    pub enabled: bool,
    /// Router reported a usage figure at all.
    pub tracked: bool,
    pub used_mb: Option<u64>,
    pub limit_mb: Option<u64>,
    /// Percent as reported, if reported.
    pub percent: Option<u8>,
    pub unit: Option<String>,
    pub cycle_start: Option<CycleAnchor>,
    pub last_rollover: Option<DateTime<Utc>>,
}

impl UsageCounter {
    /// Percent of the limit used: the router's figure, else computed.
    pub fn percent_used(&self) -> Option<u8> {
        self.percent.or_else(|| {
            let used = self.used_mb?;
            let limit = self.limit_mb.filter(|l| *l > 0)?;
            let pct = (used as f64 / limit as f64 * 100.0).round();
            Some(pct.clamp(0.0, 255.0) as u8)
        })
    }

    /// Carry rollover bookkeeping over from the previous observation.
    ///
    /// Returns `true` when the cycle anchor changed.
    fn observe(&mut self, previous: &Self, now: DateTime<Utc>) -> bool {
        match (previous.cycle_start, self.cycle_start) {
            (Some(before), Some(after)) if before != after => {
                self.last_rollover = Some(now);
                true
            }
            _ => {
                self.last_rollover = previous.last_rollover;
                false
            }
        }
    }
}

/// Usage of one SIM slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimUsage {
    pub slot: u8,
    pub name: String,
    pub counter: UsageCounter,
}

/// Usage of one WAN. Multi-SIM modems report per SIM in `sims` and leave
/// the top-level counters empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WanUsage {
    pub wan: WanId,
    pub counter: UsageCounter,
    pub sims: Vec<SimUsage>,
}

impl WanUsage {
    /// Fold in the previous observation of the same WAN, detecting cycle
    /// rollovers on the WAN counter and on every SIM present in both.
    pub fn observe_previous(&mut self, previous: &Self, now: DateTime<Utc>) {
        if self.counter.observe(&previous.counter, now) {
            info!(wan = %self.wan, "usage cycle rolled over");
        }
        for sim in &mut self.sims {
            if let Some(before) = previous.sims.iter().find(|s| s.slot == sim.slot) {
                if sim.counter.observe(&before.counter, now) {
                    info!(wan = %self.wan, sim = %sim.name, "usage cycle rolled over");
                }
            }
        }
    }
}
