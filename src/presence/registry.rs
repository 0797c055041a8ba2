use dashmap::DashMap;

use super::types::VehicleIdentity;

/// `group id -> last announced ip`. Last writer wins per key.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    cars: DashMap<String, String>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an announcement, returning the address previously held for the group.
    pub fn record(&self, identity: &VehicleIdentity) -> Option<String> {
        self.cars
            .insert(identity.group_id.clone(), identity.ip.clone())
    }

    pub fn lookup(&self, group_id: &str) -> Option<String> {
        self.cars.get(group_id).map(|entry| entry.value().clone())
    }

    pub fn entries(&self) -> Vec<VehicleIdentity> {
        self.cars
            .iter()
            .map(|entry| VehicleIdentity::new(entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }
}
