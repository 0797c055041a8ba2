//! Vehicle Platooning Library
//!
//! This library crate implements the vehicle-to-vehicle coordination protocol used to
//! form a small convoy: vehicles discover each other, negotiate who follows whom,
//! exchange periodic status while paired, and detect a silently vanished peer.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! - **`wire`**: Hex-header framing and the typed protocol messages.
//! - **`presence`**: Discovery broadcasts and the group-id to address registry.
//! - **`platoon`**: The leader/follower role slots, the heartbeat monitor and the
//!   dispatcher routing inbound datagrams into slot transitions.
//! - **`transport`**: UDP send/receive plumbing between paired vehicles.
//! - **`bus`**: Publish/subscribe channels for discovery and for mirroring traffic.
//! - **`telemetry`**: Last-known motion readings reported to followers.
//! - **`config`**: Per-vehicle configuration passed to every component.

pub mod bus;
pub mod config;
pub mod error;
pub mod platoon;
pub mod presence;
pub mod telemetry;
pub mod transport;
pub mod wire;
