// ── Domain model ──
//
// Canonical, vendor-independent record types. Raw router payloads are
// converted into these in `crate::convert`.

pub mod format;
pub mod gps;
pub mod system;
pub mod topology;
pub mod usage;
pub mod vpn;
pub mod wan;

pub use gps::GpsFix;
pub use system::{DeviceIdentity, FanReading, FanStatus, HardwareSensors};
pub use topology::{MAX_SIM_SLOTS, Topology, WanDescriptor, sim_slot_name};
pub use usage::{CycleAnchor, SimUsage, UsageCounter, WanUsage};
pub use vpn::{VpnProfile, VpnState};
pub use wan::{
    Bandwidth, CellularInfo, ConnectionStatus, LedColor, Priority, SimSlot, WanId, WanKind,
    WanStatus, WifiInfo,
};
