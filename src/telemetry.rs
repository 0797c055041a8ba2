//! Last-known motion telemetry.
//!
//! Readings arrive on the internal channel whenever the sensors publish them.
//! `LeaderStatus` always carries the latest snapshot, which may be stale if the
//! readings stopped arriving.

use serde::{Deserialize, Serialize};

use crate::bus::types::VehicleSignal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionTelemetry {
    pub speed: f32,
    pub steering_angle: f32,
    pub distance_traveled: f32,
}

impl MotionTelemetry {
    /// Folds a signal into the snapshot. Returns `false` for signals that carry no motion data.
    pub fn apply(&mut self, signal: &VehicleSignal) -> bool {
        match signal {
            VehicleSignal::Imu {
                speed,
                steering_angle,
            } => {
                self.speed = *speed;
                self.steering_angle = *steering_angle;
            }
            VehicleSignal::PedalPosition { percent } => self.speed = *percent,
            VehicleSignal::GroundSteering { angle } => self.steering_angle = *angle,
            VehicleSignal::Odometry { distance } => self.distance_traveled = *distance,
            VehicleSignal::LeaderId { .. } => return false,
        }
        true
    }
}
