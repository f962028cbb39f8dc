// ── Snapshot read model ──
//
// The only object presentation code reads. Holds one `Arc` per cadence
// slice as loaded at `read()` time, so it stays internally consistent no
// matter what the schedulers do afterwards.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::CadenceSlice;
use crate::endpoint::{Endpoint, Record};
use crate::model::{
    Bandwidth, DeviceIdentity, GpsFix, HardwareSensors, Topology, VpnProfile, WanId, WanKind,
    WanStatus, WanUsage,
};
use crate::scheduler::Cadence;

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub topology: Arc<Topology>,
    pub status: Arc<CadenceSlice>,
    pub diagnostics: Arc<CadenceSlice>,
    pub usage: Arc<CadenceSlice>,
    pub vpn: Arc<CadenceSlice>,
    pub gps: Arc<CadenceSlice>,
    pub taken_at: DateTime<Utc>,
}

/// One logical WAN with the records of every cadence lined up on its id.
#[derive(Debug, Clone, Serialize)]
pub struct WanView<'a> {
    pub id: WanId,
    pub name: String,
    pub kind: WanKind,
    /// From the status cadence.
    pub status: Option<&'a WanStatus>,
    /// From the diagnostics cadence.
    pub bandwidth: Option<Bandwidth>,
    /// From the usage cadence.
    pub usage: Option<&'a WanUsage>,
}

impl Snapshot {
    pub fn slice(&self, cadence: Cadence) -> &CadenceSlice {
        match cadence {
            Cadence::Status => &self.status,
            Cadence::Diagnostics => &self.diagnostics,
            Cadence::Usage => &self.usage,
            Cadence::Vpn => &self.vpn,
            Cadence::Gps => &self.gps,
        }
    }

    pub fn wan_statuses(&self) -> Option<&std::collections::BTreeMap<WanId, WanStatus>> {
        match self.status.value(Endpoint::WanStatus)? {
            Record::WanStatus(map) => Some(map),
            _ => None,
        }
    }

    pub fn wan_status(&self, wan: WanId) -> Option<&WanStatus> {
        self.wan_statuses()?.get(&wan)
    }

    pub fn bandwidth_for(&self, wan: WanId) -> Option<Bandwidth> {
        match self.diagnostics.value(Endpoint::Bandwidth)? {
            Record::Bandwidth(map) => map.get(&wan).copied(),
            _ => None,
        }
    }

    pub fn usage_for(&self, wan: WanId) -> Option<&WanUsage> {
        match self.usage.value(Endpoint::Usage)? {
            Record::Usage(map) => map.get(&wan),
            _ => None,
        }
    }

    /// Every WAN known from discovery or the latest status poll, merged
    /// across cadences by WAN id.
    pub fn wans(&self) -> Vec<WanView<'_>> {
        let statuses = self.wan_statuses();
        let ids: BTreeSet<WanId> = self
            .topology
            .wans
            .keys()
            .copied()
            .chain(statuses.into_iter().flat_map(|m| m.keys().copied()))
            .collect();

        ids.into_iter()
            .map(|id| {
                let status = self.wan_status(id);
                let descriptor = self.topology.wan(id);
                WanView {
                    id,
                    name: status
                        .map(|s| s.name.clone())
                        .or_else(|| descriptor.map(|d| d.name.clone()))
                        .unwrap_or_else(|| format!("WAN {id}")),
                    kind: status
                        .map(|s| s.kind)
                        .or_else(|| descriptor.map(|d| d.kind))
                        .unwrap_or(WanKind::Unknown),
                    status,
                    bandwidth: self.bandwidth_for(id),
                    usage: self.usage_for(id),
                }
            })
            .collect()
    }

    pub fn sensors(&self) -> Option<&HardwareSensors> {
        match self.diagnostics.value(Endpoint::Sensors)? {
            Record::Sensors(sensors) => Some(sensors),
            _ => None,
        }
    }

    pub fn device(&self) -> Option<&DeviceIdentity> {
        match self.diagnostics.value(Endpoint::DeviceInfo)? {
            Record::DeviceInfo(device) => Some(device),
            _ => None,
        }
    }

    pub fn firmware(&self) -> Option<&str> {
        match self.diagnostics.value(Endpoint::Firmware)? {
            Record::Firmware(version) => version.as_deref(),
            _ => None,
        }
    }

    pub fn connected_clients(&self) -> Option<usize> {
        match self.diagnostics.value(Endpoint::ConnectedClients)? {
            Record::ConnectedClients(count) => Some(*count),
            _ => None,
        }
    }

    pub fn vpn_profiles(&self) -> Option<&[VpnProfile]> {
        match self.vpn.value(Endpoint::VpnStatus)? {
            Record::VpnStatus(profiles) => Some(profiles),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&GpsFix> {
        match self.gps.value(Endpoint::Location)? {
            Record::Location(fix) => Some(fix),
            _ => None,
        }
    }
}
