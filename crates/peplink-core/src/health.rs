// ── Health monitor ──
//
// Derived connectivity flags. `evaluate` is a pure function of the cadence
// slices and two live signals (last call reachability, auth state); the
// monitor recomputes it after every tick and every command and publishes
// the result through an `ArcSwap`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::config::CadenceSet;
use crate::error::CoreError;
use crate::scheduler::Cadence;
use crate::store::{Aggregator, CadenceSlice};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthState {
    /// False when the most recent router call failed at the network level.
    pub api_reachable: bool,
    /// False when the router rejected the configured credentials.
    pub authenticated: bool,
    /// False when any active cadence is past its staleness window.
    pub data_healthy: bool,
    /// Active cadences past their staleness window.
    pub stale: Vec<Cadence>,
    /// Active cadences whose last tick failed.
    pub failing: Vec<Cadence>,
    pub evaluated_at: DateTime<Utc>,
}

impl HealthState {
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            api_reachable: true,
            authenticated: true,
            data_healthy: true,
            stale: Vec::new(),
            failing: Vec::new(),
            evaluated_at: now,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.api_reachable && self.authenticated && self.data_healthy
    }
}

/// Whether `slice` has gone longer than `interval * tolerance` without a
/// success. Before its first success the window counts from the first
/// tick; a cadence that never ticked is not stale.
pub fn is_stale(
    slice: &CadenceSlice,
    interval: Duration,
    tolerance: u32,
    now: DateTime<Utc>,
) -> bool {
    let Some(reference) = slice.runtime.last_success.or(slice.runtime.started_at) else {
        return false;
    };
    let window = TimeDelta::from_std(interval.saturating_mul(tolerance)).unwrap_or(TimeDelta::MAX);
    now.signed_duration_since(reference) > window
}

/// Compute health from active cadences and live signals.
pub fn evaluate<'a>(
    now: DateTime<Utc>,
    active: impl IntoIterator<Item = (Cadence, &'a CadenceSlice, Duration)>,
    tolerance: u32,
    api_reachable: bool,
    authenticated: bool,
) -> HealthState {
    let mut stale = Vec::new();
    let mut failing = Vec::new();
    for (cadence, slice, interval) in active {
        if is_stale(slice, interval, tolerance, now) {
            stale.push(cadence);
        }
        if slice.runtime.consecutive_failures > 0 {
            failing.push(cadence);
        }
    }

    HealthState {
        api_reachable,
        authenticated,
        data_healthy: stale.is_empty(),
        stale,
        failing,
        evaluated_at: now,
    }
}

pub(crate) struct HealthMonitor {
    reachable: AtomicBool,
    current: ArcSwap<HealthState>,
    tolerance: u32,
}

impl HealthMonitor {
    pub(crate) fn new(tolerance: u32) -> Self {
        Self {
            reachable: AtomicBool::new(true),
            current: ArcSwap::from_pointee(HealthState::initial(Utc::now())),
            tolerance,
        }
    }

    /// Note the outcome of a router call. Any response at all, even an
    /// error response, proves the router reachable.
    pub(crate) fn record_call<T>(&self, result: &Result<T, CoreError>) {
        let reachable = match result {
            Ok(_) => true,
            Err(e) => !e.kind().is_network(),
        };
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    pub(crate) fn recompute(
        &self,
        store: &Aggregator,
        cadences: &CadenceSet,
        authenticated: bool,
    ) -> Arc<HealthState> {
        let slices: Vec<_> = cadences
            .active()
            .map(|(cadence, interval)| (cadence, store.slice(cadence), interval))
            .collect();
        let state = Arc::new(evaluate(
            Utc::now(),
            slices.iter().map(|(c, s, i)| (*c, s.as_ref(), *i)),
            self.tolerance,
            self.reachable.load(Ordering::Relaxed),
            authenticated,
        ));
        self.current.store(Arc::clone(&state));
        state
    }

    pub(crate) fn current(&self) -> Arc<HealthState> {
        self.current.load_full()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::CadenceRuntime;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(secs)
    }

    fn slice(last_success: Option<i64>, started: Option<i64>, failures: u32) -> CadenceSlice {
        CadenceSlice {
            runtime: CadenceRuntime {
                last_success: last_success.map(t),
                started_at: started.map(t),
                consecutive_failures: failures,
                ..CadenceRuntime::default()
            },
            ..CadenceSlice::default()
        }
    }

    const TEN: Duration = Duration::from_secs(10);

    #[test]
    fn stale_only_past_tolerance_window() {
        let s = slice(Some(0), Some(0), 0);
        assert!(!is_stale(&s, TEN, 3, t(30)));
        assert!(is_stale(&s, TEN, 3, t(31)));
    }

    #[test]
    fn never_ticked_is_not_stale() {
        assert!(!is_stale(&slice(None, None, 0), TEN, 3, t(9_999)));
    }

    #[test]
    fn first_success_window_counts_from_start() {
        let s = slice(None, Some(0), 2);
        assert!(is_stale(&s, TEN, 3, t(45)));
    }

    #[test]
    fn one_stale_cadence_makes_data_unhealthy_and_recovers() {
        let fresh = slice(Some(95), Some(0), 0);
        let old = slice(Some(0), Some(0), 4);
        let health = evaluate(
            t(100),
            [
                (Cadence::Status, &fresh, TEN),
                (Cadence::Usage, &old, Duration::from_secs(30)),
            ],
            3,
            true,
            true,
        );
        assert!(!health.data_healthy);
        assert_eq!(health.stale, vec![Cadence::Usage]);
        assert_eq!(health.failing, vec![Cadence::Usage]);

        let recovered = slice(Some(100), Some(0), 0);
        let health = evaluate(
            t(100),
            [
                (Cadence::Status, &fresh, TEN),
                (Cadence::Usage, &recovered, Duration::from_secs(30)),
            ],
            3,
            true,
            true,
        );
        assert!(health.data_healthy);
        assert!(health.is_ok());
    }

    #[test]
    fn reachability_follows_last_call() {
        let monitor = HealthMonitor::new(3);
        monitor.record_call::<()>(&Err(CoreError::Timeout { timeout_secs: 30 }));
        assert!(!monitor.reachable.load(Ordering::Relaxed));
        monitor.record_call::<()>(&Err(CoreError::Parse {
            message: "bad".into(),
        }));
        assert!(monitor.reachable.load(Ordering::Relaxed));
    }
}
