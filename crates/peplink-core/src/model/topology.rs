// ── Router topology ──
//
// What the router has, as opposed to how it is doing. Built by discovery
// at connect time and on explicit rediscovery; polls never change it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::vpn::VpnProfile;
use super::wan::{WanId, WanKind};

/// Ids probed during discovery.
pub const DISCOVERY_WAN_IDS: std::ops::RangeInclusive<u32> = 1..=10;

/// SIM slots assumed for every cellular WAN.
pub const MAX_SIM_SLOTS: u8 = 5;

/// Display name of a SIM slot.
pub fn sim_slot_name(slot: u8) -> String {
    match slot {
        1 => "SIM A".into(),
        2 => "SIM B".into(),
        3 => "RemoteSIM".into(),
        4 => "FusionSIM".into(),
        5 => "Peplink eSIM".into(),
        other => format!("SIM {other}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WanDescriptor {
    pub id: WanId,
    pub name: String,
    pub kind: WanKind,
    pub sim_slots: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub wans: BTreeMap<WanId, WanDescriptor>,
    pub vpn_profiles: Vec<VpnProfile>,
    pub discovered_at: Option<DateTime<Utc>>,
}

impl Topology {
    pub fn wan(&self, id: WanId) -> Option<&WanDescriptor> {
        self.wans.get(&id)
    }

    /// Ids to poll; falls back to the full discovery range before discovery.
    pub fn poll_ids(&self) -> Vec<u32> {
        if self.wans.is_empty() {
            DISCOVERY_WAN_IDS.collect()
        } else {
            self.wans.keys().map(|id| id.get()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names() {
        assert_eq!(sim_slot_name(1), "SIM A");
        assert_eq!(sim_slot_name(5), "Peplink eSIM");
        assert_eq!(sim_slot_name(7), "SIM 7");
    }

    #[test]
    fn undiscovered_topology_polls_full_range() {
        assert_eq!(Topology::default().poll_ids().len(), 10);
    }
}
