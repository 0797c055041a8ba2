//! Heartbeat monitor.
//!
//! Liveness is measured as elapsed monotonic time between the last recorded
//! heartbeat and the moment the tick polls the slot, not as inter-arrival time
//! between packets.

use std::time::{Duration, Instant};

use super::types::RoleSlot;

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatMonitor {
    time_diff: Duration,
}

impl HeartbeatMonitor {
    /// `time_diff` is the maximum silence allowed before a peer counts as lost.
    pub fn new(time_diff: Duration) -> Self {
        Self { time_diff }
    }

    pub fn time_diff(&self) -> Duration {
        self.time_diff
    }

    /// Returns `true` when the peer behind `slot` has gone silent.
    pub fn is_lost(&self, slot: &RoleSlot, now: Instant) -> bool {
        self.elapsed_exceeds(slot.last_heartbeat, now)
    }

    /// A heartbeat that was never recorded is never lost.
    pub fn elapsed_exceeds(&self, last_heartbeat: Option<Instant>, now: Instant) -> bool {
        match last_heartbeat {
            None => false,
            Some(last) => now.saturating_duration_since(last) >= self.time_diff,
        }
    }
}
