use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;

use super::registry::PresenceRegistry;
use super::types::VehicleIdentity;
use crate::bus::MessageBus;
use crate::bus::types::BusMessage;
use crate::wire::messages::{AnnouncePresence, ProtocolMessage};

/// Broadcasts this vehicle's presence and maintains the registry of other vehicles.
///
/// Whether this vehicle *should* announce itself depends on its role slots, which
/// this service does not see; that guard lives in
/// [`PlatoonService::announce_presence`](crate::platoon::service::PlatoonService::announce_presence).
pub struct PresenceService {
    pub local: VehicleIdentity,
    pub registry: PresenceRegistry,
    discovery: Arc<dyn MessageBus>,
    internal: Arc<dyn MessageBus>,
}

impl PresenceService {
    pub fn new(
        local: VehicleIdentity,
        discovery: Arc<dyn MessageBus>,
        internal: Arc<dyn MessageBus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            local,
            registry: PresenceRegistry::new(),
            discovery,
            internal,
        })
    }

    /// Emits an `AnnouncePresence` for this vehicle on the discovery channel.
    pub async fn broadcast(&self) -> Result<()> {
        let msg = BusMessage::Protocol(ProtocolMessage::AnnouncePresence(AnnouncePresence::from(
            &self.local,
        )));

        self.discovery.publish(msg.clone()).await?;
        tracing::debug!(
            "Announced presence: group {} at {}",
            self.local.group_id,
            self.local.ip
        );

        self.internal.publish(msg).await?;
        Ok(())
    }

    /// Records an announcement unconditionally and mirrors it to the internal channel.
    pub async fn on_announcement(&self, remote: VehicleIdentity) {
        match self.registry.record(&remote) {
            Some(previous) if previous == remote.ip => {
                tracing::trace!("Group {} still at {}", remote.group_id, remote.ip);
            }
            Some(previous) => {
                tracing::info!(
                    "Group {} moved from {} to {}",
                    remote.group_id,
                    previous,
                    remote.ip
                );
            }
            None => {
                tracing::info!("Discovered group {} at {}", remote.group_id, remote.ip);
            }
        }

        let msg = BusMessage::Protocol(ProtocolMessage::AnnouncePresence(AnnouncePresence::from(
            &remote,
        )));
        if let Err(e) = self.internal.publish(msg).await {
            tracing::warn!("Failed to mirror announcement: {}", e);
        }
    }

    pub fn lookup(&self, group_id: &str) -> Option<String> {
        self.registry.lookup(group_id)
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.listen_loop().await;
        })
    }

    async fn listen_loop(self: Arc<Self>) {
        let mut rx = self.discovery.subscribe();

        loop {
            match rx.recv().await {
                Ok(envelope) => match envelope.message {
                    BusMessage::Protocol(ProtocolMessage::AnnouncePresence(msg)) => {
                        self.on_announcement(msg.into()).await;
                    }
                    other => {
                        tracing::debug!("Unexpected message on discovery channel: {:?}", other);
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Discovery listener lagged, skipped {} messages", skipped);
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Discovery channel closed");
                    break;
                }
            }
        }
    }
}
