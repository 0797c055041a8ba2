//! LAN discovery bus.
//!
//! Envelopes are `bincode`-encoded and sent as UDP broadcasts to a fixed port.
//! Every vehicle binds that port and re-publishes what it hears to its local
//! subscribers. A vehicle hears its own broadcasts too.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use super::MessageBus;
use super::local::LocalBus;
use super::types::{BusMessage, Envelope};
use crate::error::V2vError;

pub struct UdpBroadcastBus {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    local: LocalBus,
}

impl UdpBroadcastBus {
    /// Binds `0.0.0.0:port` and broadcasts to `255.255.255.255:port`.
    pub async fn bind(channel: u16, port: u16) -> anyhow::Result<Arc<Self>> {
        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let target = SocketAddr::from((Ipv4Addr::BROADCAST, port));
        Self::bind_with_target(channel, bind_addr, target).await
    }

    /// Binds `bind_addr` and sends every published envelope to `target`.
    pub async fn bind_with_target(
        channel: u16,
        bind_addr: SocketAddr,
        target: SocketAddr,
    ) -> anyhow::Result<Arc<Self>> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|source| V2vError::Bind {
                addr: bind_addr,
                source,
            })?;
        socket.set_broadcast(true)?;

        tracing::info!(
            "Bus channel {} bound to {}, publishing to {}",
            channel,
            socket.local_addr()?,
            target
        );

        Ok(Arc::new(Self {
            socket: Arc::new(socket),
            target,
            local: LocalBus::new(channel),
        }))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.receive_loop().await;
        })
    }

    async fn receive_loop(self: Arc<Self>) {
        let mut buf = vec![0u8; 65536];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, src)) => match bincode::deserialize::<Envelope>(&buf[..len]) {
                    Ok(envelope) if envelope.channel == self.local.channel() => {
                        tracing::trace!("Bus envelope from {}", src);
                        self.local.deliver(envelope);
                    }
                    Ok(envelope) => {
                        tracing::debug!(
                            "Ignoring envelope for channel {} from {}",
                            envelope.channel,
                            src
                        );
                    }
                    Err(e) => {
                        tracing::warn!("Failed to deserialize bus envelope from {}: {}", src, e);
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to receive bus packet: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

#[async_trait]
impl MessageBus for UdpBroadcastBus {
    fn channel(&self) -> u16 {
        self.local.channel()
    }

    async fn publish(&self, message: BusMessage) -> anyhow::Result<()> {
        let envelope = Envelope::new(self.channel(), message);
        let encoded = bincode::serialize(&envelope)?;
        self.socket.send_to(&encoded, self.target).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.local.subscribe()
    }
}
