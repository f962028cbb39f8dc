// ── Cadence schedulers ──
//
// One background task per enabled cadence. Each task owns a timer and
// drives the endpoints registered for its cadence. A tick never overlaps
// with another tick of the same cadence: a scheduled tick that finds the
// previous one still running is skipped, a manual poll waits for it.
// Different cadences run fully independently.

use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};
use tokio::sync::MutexGuard;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::router::Engine;

/// An independently scheduled polling loop.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Cadence {
    /// Fast loop: WAN status, IP, priority, cellular signal.
    Status,
    Diagnostics,
    Usage,
    Vpn,
    Gps,
}

impl Cadence {
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Endpoints driven by this cadence.
    pub fn endpoints(self) -> &'static [Endpoint] {
        match self {
            Self::Status => &[Endpoint::WanStatus],
            Self::Diagnostics => &[
                Endpoint::Bandwidth,
                Endpoint::Sensors,
                Endpoint::DeviceInfo,
                Endpoint::Firmware,
                Endpoint::ConnectedClients,
            ],
            Self::Usage => &[Endpoint::Usage],
            Self::Vpn => &[Endpoint::VpnStatus],
            Self::Gps => &[Endpoint::Location],
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// How a finished tick went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TickOutcome {
    Success,
    Failed,
}

// ── Background task ──────────────────────────────────────────────

/// Timer loop for one cadence. The first tick fires immediately so the
/// snapshot fills as soon as the router connects.
pub(crate) async fn cadence_task(
    engine: std::sync::Arc<Engine>,
    cadence: Cadence,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(%cadence, period_secs = period.as_secs(), "cadence scheduler started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Ok(guard) = engine.tick_guard(cadence).try_lock() else {
                    debug!(%cadence, "previous tick still running, skipping");
                    continue;
                };
                run_tick(&engine, cadence, &cancel, guard).await;
            }
        }
    }
    debug!(%cadence, "cadence scheduler stopped");
}

/// Run one tick now, waiting for any in-flight tick of the same cadence.
pub(crate) async fn tick_now(
    engine: &Engine,
    cadence: Cadence,
    cancel: &CancellationToken,
) -> Option<TickOutcome> {
    let guard = engine.tick_guard(cadence).lock().await;
    run_tick(engine, cadence, cancel, guard).await
}

/// Fetch every supported endpoint of `cadence` concurrently and apply the
/// results as one unit. Returns `None` when cancellation arrived while the
/// requests were in flight; those results are discarded.
async fn run_tick(
    engine: &Engine,
    cadence: Cadence,
    cancel: &CancellationToken,
    _guard: MutexGuard<'_, ()>,
) -> Option<TickOutcome> {
    engine.store.begin(cadence, Utc::now());

    let skipped = engine.store.unsupported(cadence);
    let endpoints: Vec<Endpoint> = cadence
        .endpoints()
        .iter()
        .copied()
        .filter(|e| !skipped.contains(e))
        .collect();
    let wan_ids = engine.store.topology().poll_ids();

    let results = join_all(endpoints.iter().map(|e| engine.fetch(*e, &wan_ids))).await;

    if cancel.is_cancelled() {
        debug!(%cadence, "cancelled mid-tick, discarding results");
        engine.store.abandon(cadence);
        return None;
    }

    let outcome = engine.store.apply(
        cadence,
        endpoints.into_iter().zip(results).collect(),
        Utc::now(),
    );
    if outcome == TickOutcome::Failed {
        let failures = engine.store.slice(cadence).runtime.consecutive_failures;
        warn!(%cadence, consecutive_failures = failures, "poll failed");
    } else {
        debug!(%cadence, "poll succeeded");
    }

    engine.refresh_health();
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_iteration_order() {
        for (i, cadence) in Cadence::all().enumerate() {
            assert_eq!(cadence.index(), i);
        }
        assert_eq!(Cadence::COUNT, 5);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("GPS".parse::<Cadence>().ok(), Some(Cadence::Gps));
        assert_eq!(Cadence::Diagnostics.to_string(), "diagnostics");
    }
}
