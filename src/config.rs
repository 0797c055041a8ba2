//! Vehicle configuration.
//!
//! Everything the protocol core needs to know about "this" vehicle lives in a
//! [`VehicleConfig`] handed to each component at construction time.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::presence::types::VehicleIdentity;

/// Unicast port every vehicle receives protocol datagrams on.
pub const DEFAULT_PORT: u16 = 50001;
/// Port the discovery channel is broadcast on.
pub const DEFAULT_DISCOVERY_PORT: u16 = 50250;
pub const DEFAULT_GROUP_ID: &str = "1";

#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// This vehicle's own address, as announced to others.
    pub ip: String,
    pub group_id: String,
    /// Maximum silence tolerated from a paired peer.
    pub time_diff: Duration,
    /// Periodic tick frequency in Hz.
    pub frequency_hz: f64,
    /// Group to follow, resolved through the presence registry.
    pub follow_group: Option<String>,
    pub port: u16,
    pub discovery_port: u16,
}

impl VehicleConfig {
    pub fn new(
        ip: impl Into<String>,
        group_id: impl Into<String>,
        time_diff_ms: u64,
        frequency_hz: f64,
    ) -> Result<Self> {
        let ip = ip.into();

        if ip.parse::<IpAddr>().is_err() {
            bail!("invalid vehicle ip {:?}", ip);
        }
        if time_diff_ms == 0 {
            bail!("heartbeat timeout must be a positive number of milliseconds");
        }
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            bail!("tick frequency must be positive, got {}", frequency_hz);
        }

        Ok(Self {
            ip,
            group_id: group_id.into(),
            time_diff: Duration::from_millis(time_diff_ms),
            frequency_hz,
            follow_group: None,
            port: DEFAULT_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
        })
    }

    pub fn with_follow_group(mut self, group_id: Option<String>) -> Self {
        self.follow_group = group_id;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = port;
        self
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz)
    }

    pub fn identity(&self) -> VehicleIdentity {
        VehicleIdentity::new(self.group_id.clone(), self.ip.clone())
    }
}
