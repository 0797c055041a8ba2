use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Which of the two slots a transition applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    /// Slot holding the vehicle we follow.
    Leader,
    /// Slot holding the vehicle following us.
    Follower,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    /// A `FollowRequest` went out; waiting for the `FollowResponse`.
    Requesting,
    Established,
}

/// Single-peer relationship state for one role.
///
/// Invariant: `peer_ip` is `None` exactly when `state` is `Idle`. A slot returns to
/// `Idle` before a new peer may occupy it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSlot {
    pub role: Role,
    pub peer_ip: Option<String>,
    pub state: SlotState,

    /// `None` until the first heartbeat (or request) is recorded.
    #[serde(skip)]
    pub last_heartbeat: Option<Instant>,
}

impl RoleSlot {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            peer_ip: None,
            state: SlotState::Idle,
            last_heartbeat: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == SlotState::Idle
    }

    pub fn is_peer(&self, ip: &str) -> bool {
        self.peer_ip.as_deref() == Some(ip)
    }

    pub fn occupy(&mut self, peer_ip: &str, state: SlotState, now: Instant) {
        self.peer_ip = Some(peer_ip.to_string());
        self.state = state;
        self.last_heartbeat = Some(now);
    }

    /// Returns the slot to `Idle`, handing back the peer it held.
    pub fn reset(&mut self) -> Option<String> {
        self.state = SlotState::Idle;
        self.last_heartbeat = None;
        self.peer_ip.take()
    }

    pub fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            role: self.role,
            state: self.state,
            peer_ip: self.peer_ip.clone(),
        }
    }
}

/// Point-in-time view of a slot for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub role: Role,
    pub state: SlotState,
    pub peer_ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatoonSnapshot {
    pub leader: SlotSnapshot,
    pub follower: SlotSnapshot,
}

impl PlatoonSnapshot {
    pub fn is_idle(&self) -> bool {
        self.leader.state == SlotState::Idle && self.follower.state == SlotState::Idle
    }
}
