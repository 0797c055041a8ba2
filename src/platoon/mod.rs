//! Platoon Role Negotiation Module
//!
//! Each vehicle holds two independent role slots:
//! - the **leader slot**: the peer this vehicle follows,
//! - the **follower slot**: the peer following this vehicle.
//!
//! ## Core Mechanisms
//! - **Negotiation**: `FollowRequest` / `FollowResponse` move a slot from `Idle` to `Established`.
//!   The follower slot is first-come-first-served; later requests are ignored, not queued.
//! - **Heartbeats**: While paired, leaders send `LeaderStatus` downstream and followers send
//!   `FollowerStatus` upstream. Each receipt refreshes the slot's heartbeat.
//! - **Failure Detection**: On every tick, a slot silent for longer than the configured
//!   timeout is torn down and a `StopFollow` is sent to the vanished peer.
//! - **Dispatch**: Inbound datagrams are decoded and routed into the transitions above.

pub mod dispatcher;
pub mod heartbeat;
pub mod service;
pub mod types;
