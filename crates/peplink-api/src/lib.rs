// peplink-api: Async Rust client for the Peplink / Pepwave router local REST API

pub mod auth;
pub mod client;
pub mod control;
pub mod error;
pub mod location;
pub mod models;
pub mod system;
pub mod transport;
pub mod usage;
pub mod vpn;
pub mod wan;

pub use auth::{Session, TokenGrant};
pub use client::PeplinkClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
