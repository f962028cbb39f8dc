//! Polling, session and state-aggregation engine for Peplink / Pepwave
//! routers, built on `peplink-api`.
//!
//! - **[`Router`]**: facade owning one router's whole lifecycle.
//!   [`connect()`](Router::connect) discovers the WANs and spawns one
//!   scheduler per enabled [`Cadence`] plus a command processor.
//!   [`Router::oneshot()`] connects without background polling for single
//!   CLI invocations.
//!
//! - **[`SessionManager`]**: single-flight login and transparent
//!   re-authentication shared by every poller and command.
//!
//! - **[`Aggregator`]**: one atomically swapped slice per cadence. Readers
//!   get an immutable [`Snapshot`] and never block.
//!
//! - **[`Command`]**: typed mutations (`SetWanPriority`, `ResetModem`,
//!   `RediscoverHardware`) routed through an `mpsc` channel.
//!
//! - **[`HealthState`]**: reachability, authentication and data freshness,
//!   recomputed after every tick and command.
//!
//! - **[`Fleet`]**: many independent routers in one process.

pub mod command;
pub mod config;
pub mod convert;
pub mod endpoint;
pub mod error;
pub mod fleet;
pub mod health;
pub mod model;
pub mod router;
pub mod scheduler;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{
    AuthCredentials, CadenceConfig, CadenceSet, LoginPolicy, RouterConfig, TlsVerification,
};
pub use endpoint::{Endpoint, Record};
pub use error::{CoreError, ErrorKind, FetchError};
pub use fleet::Fleet;
pub use health::HealthState;
pub use router::{Router, RouterState};
pub use scheduler::{Cadence, TickOutcome};
pub use session::{AuthState, SessionManager};
pub use store::{Aggregator, CadenceSlice, Snapshot, Tracked, WanView};

pub use model::{
    Bandwidth, CellularInfo, ConnectionStatus, CycleAnchor, DeviceIdentity, GpsFix,
    HardwareSensors, Priority, Topology, VpnProfile, VpnState, WanDescriptor, WanId, WanKind,
    WanStatus, WanUsage,
};
