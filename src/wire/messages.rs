//! Protocol message definitions.
//!
//! Payload fields are serialized with `bincode` and then framed by [`codec`](super::codec).

use serde::{Deserialize, Serialize};

use super::codec::{self, WireMessage};
use crate::error::{V2vError, V2vResult};

pub const ANNOUNCE_PRESENCE: u16 = 1001;
pub const FOLLOW_REQUEST: u16 = 1002;
pub const FOLLOW_RESPONSE: u16 = 1003;
pub const STOP_FOLLOW: u16 = 1004;
pub const LEADER_STATUS: u16 = 2001;
pub const FOLLOWER_STATUS: u16 = 3001;

/// Discovery broadcast: "this vehicle is available to be followed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncePresence {
    pub vehicle_ip: String,
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowRequest {
    pub status: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowResponse {
    pub status: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopFollow {
    pub status: u8,
}

/// Sent downstream by a leader. Doubles as the follower's heartbeat source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderStatus {
    /// Wall clock at send time, in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub speed: f32,
    pub steering_angle: f32,
    pub distance_traveled: f32,
}

/// Sent upstream by a follower as a pure keep-alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerStatus {
    pub status: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProtocolMessage {
    AnnouncePresence(AnnouncePresence),
    FollowRequest(FollowRequest),
    FollowResponse(FollowResponse),
    StopFollow(StopFollow),
    LeaderStatus(LeaderStatus),
    FollowerStatus(FollowerStatus),
}

impl ProtocolMessage {
    pub fn follow_request() -> Self {
        Self::FollowRequest(FollowRequest { status: 1 })
    }

    pub fn follow_response() -> Self {
        Self::FollowResponse(FollowResponse { status: 1 })
    }

    pub fn stop_follow() -> Self {
        Self::StopFollow(StopFollow { status: 1 })
    }

    pub fn follower_status() -> Self {
        Self::FollowerStatus(FollowerStatus { status: 1 })
    }

    pub fn id(&self) -> u16 {
        match self {
            Self::AnnouncePresence(_) => ANNOUNCE_PRESENCE,
            Self::FollowRequest(_) => FOLLOW_REQUEST,
            Self::FollowResponse(_) => FOLLOW_RESPONSE,
            Self::StopFollow(_) => STOP_FOLLOW,
            Self::LeaderStatus(_) => LEADER_STATUS,
            Self::FollowerStatus(_) => FOLLOWER_STATUS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AnnouncePresence(_) => "AnnouncePresence",
            Self::FollowRequest(_) => "FollowRequest",
            Self::FollowResponse(_) => "FollowResponse",
            Self::StopFollow(_) => "StopFollow",
            Self::LeaderStatus(_) => "LeaderStatus",
            Self::FollowerStatus(_) => "FollowerStatus",
        }
    }

    /// Serializes the message fields and frames them under the message id.
    pub fn to_frame(&self) -> V2vResult<Vec<u8>> {
        let payload = match self {
            Self::AnnouncePresence(m) => bincode::serialize(m)?,
            Self::FollowRequest(m) => bincode::serialize(m)?,
            Self::FollowResponse(m) => bincode::serialize(m)?,
            Self::StopFollow(m) => bincode::serialize(m)?,
            Self::LeaderStatus(m) => bincode::serialize(m)?,
            Self::FollowerStatus(m) => bincode::serialize(m)?,
        };

        codec::encode(self.id(), &payload)
    }

    /// Interprets an already-decoded frame.
    ///
    /// Unknown ids yield [`V2vError::UnknownMessageId`]; a payload that does not
    /// deserialize as the message its id names is treated as malformed.
    pub fn from_wire(wire: &WireMessage) -> V2vResult<Self> {
        let payload = wire.payload.as_slice();

        let message = match wire.id {
            ANNOUNCE_PRESENCE => Self::AnnouncePresence(from_payload(payload)?),
            FOLLOW_REQUEST => Self::FollowRequest(from_payload(payload)?),
            FOLLOW_RESPONSE => Self::FollowResponse(from_payload(payload)?),
            STOP_FOLLOW => Self::StopFollow(from_payload(payload)?),
            LEADER_STATUS => Self::LeaderStatus(from_payload(payload)?),
            FOLLOWER_STATUS => Self::FollowerStatus(from_payload(payload)?),
            other => return Err(V2vError::UnknownMessageId(other)),
        };

        Ok(message)
    }
}

fn from_payload<T: for<'de> Deserialize<'de>>(payload: &[u8]) -> V2vResult<T> {
    bincode::deserialize(payload)
        .map_err(|e| V2vError::malformed(format!("undecodable payload: {}", e)))
}
