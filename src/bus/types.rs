use serde::{Deserialize, Serialize};

use crate::wire::messages::ProtocolMessage;

/// Channel on which vehicles announce themselves to each other.
pub const DISCOVERY_CHANNEL: u16 = 250;
/// Channel mirroring protocol traffic and carrying local vehicle signals.
pub const INTERNAL_CHANNEL: u16 = 122;

/// Readings and commands delivered to the vehicle over the internal channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VehicleSignal {
    Imu { speed: f32, steering_angle: f32 },
    /// Pedal position in percent; used as the speed reading.
    PedalPosition { percent: f32 },
    GroundSteering { angle: f32 },
    Odometry { distance: f32 },
    /// Selects the group this vehicle should try to follow.
    LeaderId { group_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BusMessage {
    Protocol(ProtocolMessage),
    Vehicle(VehicleSignal),
}

/// A message as it travels on a bus channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: u16,
    /// Wall clock at publish time, in milliseconds since the Unix epoch.
    pub sent_at_ms: u64,
    pub message: BusMessage,
}

impl Envelope {
    pub fn new(channel: u16, message: BusMessage) -> Self {
        Self {
            channel,
            sent_at_ms: now_ms(),
            message,
        }
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
