//! Error kinds shared by the codec, the dispatcher and the role state machine.
//!
//! None of these are fatal. The only unrecoverable condition, failing to bind
//! the receive socket, is surfaced as [`V2vError::Bind`] and aborts start-up.

use std::net::SocketAddr;

use crate::platoon::types::{Role, SlotState};

#[derive(Debug, thiserror::Error)]
pub enum V2vError {
    /// Frame shorter than its header, unparsable header, or length mismatch.
    #[error("malformed frame: {reason}")]
    Malformed { reason: String },

    #[error("unknown message id {0}")]
    UnknownMessageId(u16),

    /// A transition was attempted while the slot was in the wrong state.
    #[error("{role:?} slot rejected {action} while {state:?}")]
    GuardRejected {
        role: Role,
        state: SlotState,
        action: &'static str,
    },

    /// A message arrived from someone other than the slot's peer.
    #[error("expected message from {expected:?}, got {actual}")]
    PeerMismatch {
        expected: Option<String>,
        actual: String,
    },

    #[error("payload serialization failed: {0}")]
    Payload(#[from] bincode::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl V2vError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Guard rejections and peer mismatches are ordinary concurrent-network
    /// noise and are not reported as errors.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::GuardRejected { .. } | Self::PeerMismatch { .. })
    }
}

pub type V2vResult<T> = Result<T, V2vError>;
