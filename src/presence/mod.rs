//! Presence & Discovery Module
//!
//! Vehicles that are not paired advertise themselves on the discovery channel.
//! Every vehicle records the most recent address announced for each group id, which is
//! how a vehicle configured to follow "group 7" finds out where group 7 currently is.
//!
//! Entries never expire. Liveness is tracked per pairing by the heartbeat monitor,
//! not per registry entry.

pub mod registry;
pub mod service;
pub mod types;
