//! Herald - topic-addressed alert notification gateway
//!
//! Herald routes inbound alert posts to logical topics, persists them in
//! an external store, fans them out in real time to connected clients,
//! and tracks the acknowledged/read lifecycle.
//!
//! ## Components
//!
//! - **Topics**: slug derivation and fuzzy slug-to-topic resolution
//! - **Delivery**: the insert path, the broadcast feed, and per-session
//!   dispatch with bounded recent state and local presentation
//! - **Acknowledgment**: idempotent read-state transitions with an
//!   optimistic-update-then-rollback commit over dual paths
//! - **Server**: hyper HTTP surface plus the WebSocket feed

pub mod ack;
pub mod config;
pub mod db;
pub mod delivery;
pub mod routes;
pub mod server;
pub mod topics;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HeraldError, Result};
