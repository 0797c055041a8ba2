use serde::{Deserialize, Serialize};

use crate::wire::messages::AnnouncePresence;

/// A vehicle as it is known on the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VehicleIdentity {
    pub group_id: String,
    pub ip: String,
}

impl VehicleIdentity {
    pub fn new(group_id: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            ip: ip.into(),
        }
    }
}

impl From<AnnouncePresence> for VehicleIdentity {
    fn from(msg: AnnouncePresence) -> Self {
        Self {
            group_id: msg.group_id,
            ip: msg.vehicle_ip,
        }
    }
}

impl From<&VehicleIdentity> for AnnouncePresence {
    fn from(identity: &VehicleIdentity) -> Self {
        Self {
            vehicle_ip: identity.ip.clone(),
            group_id: identity.group_id.clone(),
        }
    }
}
