//! Inbound datagram dispatcher.
//!
//! Decodes each datagram and routes it into the matching transition. Malformed frames
//! and unknown ids are logged and dropped; guard rejections are traced quietly.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::service::PlatoonService;
use crate::error::V2vResult;
use crate::presence::service::PresenceService;
use crate::transport::receiver::Datagram;
use crate::wire::codec;
use crate::wire::messages::ProtocolMessage;

pub struct Dispatcher {
    platoon: Arc<PlatoonService>,
    presence: Arc<PresenceService>,
}

impl Dispatcher {
    pub fn new(platoon: Arc<PlatoonService>, presence: Arc<PresenceService>) -> Arc<Self> {
        Arc::new(Self { platoon, presence })
    }

    /// Drains the dispatch queue until every sender is gone.
    pub async fn run(self: Arc<Self>, mut queue: mpsc::Receiver<Datagram>) {
        tracing::info!("Dispatcher started");

        while let Some(datagram) = queue.recv().await {
            let sender = datagram.sender.ip().to_string();
            self.handle_datagram(&datagram.bytes, &sender, Instant::now())
                .await;
        }

        tracing::info!("Dispatch queue closed, dispatcher stopped");
    }

    /// Handles one datagram from `sender` (an address, with or without a port).
    pub async fn handle_datagram(&self, data: &[u8], sender: &str, now: Instant) {
        let peer_ip = peer_ip(sender);

        let wire = match codec::decode(data) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::warn!("Dropping datagram from {}: {}", peer_ip, e);
                return;
            }
        };

        let message = match ProtocolMessage::from_wire(&wire) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping datagram from {}: {}", peer_ip, e);
                return;
            }
        };

        tracing::debug!("Received {} from {}", message.name(), peer_ip);

        if let Err(e) = self.route(message, &peer_ip, now).await {
            if e.is_benign() {
                tracing::debug!("Ignored message from {}: {}", peer_ip, e);
            } else {
                tracing::warn!("Failed to handle message from {}: {}", peer_ip, e);
            }
        }
    }

    async fn route(&self, message: ProtocolMessage, peer_ip: &str, now: Instant) -> V2vResult<()> {
        match message {
            ProtocolMessage::AnnouncePresence(announcement) => {
                self.presence.on_announcement(announcement.into()).await;
                Ok(())
            }
            ProtocolMessage::FollowRequest(request) => {
                self.platoon.on_follow_request(peer_ip, request, now).await
            }
            ProtocolMessage::FollowResponse(response) => {
                self.platoon.on_follow_response(peer_ip, response, now).await
            }
            ProtocolMessage::StopFollow(stop) => self.platoon.on_stop_follow(peer_ip, stop).await,
            ProtocolMessage::LeaderStatus(status) => {
                self.platoon.on_leader_status(peer_ip, status, now).await
            }
            ProtocolMessage::FollowerStatus(status) => {
                self.platoon.on_follower_status(peer_ip, status, now).await
            }
        }
    }
}

/// The address portion of `sender`, without any port.
pub fn peer_ip(sender: &str) -> String {
    if let Ok(addr) = sender.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    if let Ok(ip) = sender.parse::<IpAddr>() {
        return ip.to_string();
    }

    match sender.split_once(':') {
        Some((ip, _)) => ip.to_string(),
        None => sender.to_string(),
    }
}
