// ── State aggregator ──
//
// Each cadence owns one `CadenceSlice` behind its own `ArcSwap`. `apply`
// builds the next slice from the current one and swaps it in whole, so a
// reader sees either the old slice or the new one, never a mix. Slices of
// different cadences are independent swaps and never block each other;
// readers never block at all.

mod snapshot;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::EnumCount;
use tracing::info;

use crate::endpoint::{Endpoint, Record};
use crate::error::{CoreError, FetchError};
use crate::model::Topology;
use crate::scheduler::{Cadence, TickOutcome};

pub use snapshot::{Snapshot, WanView};

/// A record plus its freshness bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tracked<T> {
    /// Last successfully parsed value. Survives later failures.
    pub value: Option<T>,
    /// When `value` was fetched. Only advances on success.
    pub updated_at: Option<DateTime<Utc>>,
    /// Most recent failure; cleared by the next success.
    pub last_error: Option<FetchError>,
    /// The router's firmware lacks this endpoint; it is no longer polled.
    pub unsupported: bool,
}

impl<T> Default for Tracked<T> {
    fn default() -> Self {
        Self {
            value: None,
            updated_at: None,
            last_error: None,
            unsupported: false,
        }
    }
}

/// Where a cadence is in its tick cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
}

/// Scheduler bookkeeping for one cadence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CadenceRuntime {
    pub phase: Phase,
    pub last_outcome: Option<TickOutcome>,
    pub consecutive_failures: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    /// First tick of this cadence; staleness is measured from here until
    /// the first success.
    pub started_at: Option<DateTime<Utc>>,
}

/// Everything one cadence owns in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CadenceSlice {
    pub records: BTreeMap<Endpoint, Tracked<Record>>,
    pub runtime: CadenceRuntime,
}

impl CadenceSlice {
    pub fn record(&self, endpoint: Endpoint) -> Option<&Tracked<Record>> {
        self.records.get(&endpoint)
    }

    pub fn value(&self, endpoint: Endpoint) -> Option<&Record> {
        self.record(endpoint).and_then(|t| t.value.as_ref())
    }

    /// Fold one tick's results into a copy of this slice.
    fn with_results(
        &self,
        results: &[(Endpoint, Result<Record, CoreError>)],
        outcome: TickOutcome,
        now: DateTime<Utc>,
    ) -> Self {
        let mut next = self.clone();
        for (endpoint, result) in results {
            let slot = next.records.entry(*endpoint).or_default();
            match result {
                Ok(record) => {
                    let mut record = record.clone();
                    if let (Record::Usage(fresh), Some(Record::Usage(previous))) =
                        (&mut record, slot.value.as_ref())
                    {
                        for (wan, usage) in fresh.iter_mut() {
                            if let Some(before) = previous.get(wan) {
                                usage.observe_previous(before, now);
                            }
                        }
                    }
                    slot.value = Some(record);
                    slot.updated_at = Some(now);
                    slot.last_error = None;
                }
                Err(CoreError::UnsupportedFeature { .. }) => {
                    slot.unsupported = true;
                    slot.last_error = None;
                }
                Err(e) => {
                    slot.last_error = Some(FetchError::new(e, now));
                }
            }
        }

        let runtime = &mut next.runtime;
        runtime.phase = Phase::Idle;
        runtime.last_outcome = Some(outcome);
        runtime.last_attempt = Some(now);
        runtime.started_at.get_or_insert(now);
        match outcome {
            TickOutcome::Success => {
                runtime.consecutive_failures = 0;
                runtime.last_success = Some(now);
            }
            TickOutcome::Failed => {
                runtime.consecutive_failures = runtime.consecutive_failures.saturating_add(1);
            }
        }
        next
    }
}

/// Holds the latest slice of every cadence plus the discovered topology.
pub struct Aggregator {
    slices: [ArcSwap<CadenceSlice>; Cadence::COUNT],
    topology: ArcSwap<Topology>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            slices: std::array::from_fn(|_| ArcSwap::from_pointee(CadenceSlice::default())),
            topology: ArcSwap::from_pointee(Topology::default()),
        }
    }

    fn cell(&self, cadence: Cadence) -> &ArcSwap<CadenceSlice> {
        &self.slices[cadence.index()]
    }

    pub fn slice(&self, cadence: Cadence) -> Arc<CadenceSlice> {
        self.cell(cadence).load_full()
    }

    pub fn topology(&self) -> Arc<Topology> {
        self.topology.load_full()
    }

    pub fn set_topology(&self, topology: Topology) {
        self.topology.store(Arc::new(topology));
    }

    /// Mark a cadence as running.
    pub fn begin(&self, cadence: Cadence, now: DateTime<Utc>) {
        self.cell(cadence).rcu(|current| {
            let mut next = CadenceSlice::clone(current);
            next.runtime.phase = Phase::Running;
            next.runtime.started_at.get_or_insert(now);
            next
        });
    }

    /// Return a cancelled tick's cadence to idle without touching its
    /// records or outcome.
    pub fn abandon(&self, cadence: Cadence) {
        self.cell(cadence).rcu(|current| {
            let mut next = CadenceSlice::clone(current);
            next.runtime.phase = Phase::Idle;
            next
        });
    }

    /// Apply one tick's results for `cadence` atomically.
    ///
    /// Successes replace their record and timestamp; failures keep the
    /// prior value and timestamp and only record the error; unsupported
    /// endpoints are flagged and skipped from then on. The tick fails if
    /// any endpoint failed for a reason other than being unsupported.
    pub fn apply(
        &self,
        cadence: Cadence,
        results: Vec<(Endpoint, Result<Record, CoreError>)>,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        let failed = results.iter().any(|(_, r)| {
            matches!(r, Err(e) if !matches!(e, CoreError::UnsupportedFeature { .. }))
        });
        let outcome = if failed {
            TickOutcome::Failed
        } else {
            TickOutcome::Success
        };

        let previous = self
            .cell(cadence)
            .rcu(|current| current.with_results(&results, outcome, now));

        for (endpoint, result) in &results {
            let newly_unsupported = matches!(result, Err(CoreError::UnsupportedFeature { .. }))
                && !previous.record(*endpoint).is_some_and(|t| t.unsupported);
            if newly_unsupported {
                info!(%cadence, %endpoint, "endpoint not supported by this router, no longer polled");
            }
        }
        outcome
    }

    /// Endpoints of `cadence` known to be unsupported.
    pub fn unsupported(&self, cadence: Cadence) -> BTreeSet<Endpoint> {
        self.cell(cadence)
            .load()
            .records
            .iter()
            .filter(|(_, t)| t.unsupported)
            .map(|(e, _)| *e)
            .collect()
    }

    /// Forget unsupported markers so the next ticks probe again.
    pub fn clear_unsupported(&self) {
        for cell in &self.slices {
            cell.rcu(|current| {
                let mut next = CadenceSlice::clone(current);
                for tracked in next.records.values_mut() {
                    tracked.unsupported = false;
                }
                next
            });
        }
    }

    /// Immutable view of everything. Cheap: one `Arc` clone per slice.
    pub fn read(&self) -> Snapshot {
        Snapshot {
            topology: self.topology(),
            status: self.slice(Cadence::Status),
            diagnostics: self.slice(Cadence::Diagnostics),
            usage: self.slice(Cadence::Usage),
            vpn: self.slice(Cadence::Vpn),
            gps: self.slice(Cadence::Gps),
            taken_at: Utc::now(),
        }
    }
}
