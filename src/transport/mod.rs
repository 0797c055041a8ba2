//! UDP Transport Module
//!
//! Unicast plumbing between paired vehicles.
//!
//! - **`sender`**: The [`Transport`](sender::Transport) seam used by the role state machine,
//!   and its UDP implementation that keeps one outbound socket per paired peer.
//! - **`receiver`**: Binds the receive port and moves every datagram onto a bounded queue
//!   so the receive loop itself never waits on protocol work.

pub mod receiver;
pub mod sender;
