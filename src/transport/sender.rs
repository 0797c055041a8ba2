use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::net::UdpSocket;

/// Fire-and-forget delivery of frames to a peer address.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, peer_ip: &str, frame: &[u8]) -> Result<()>;

    /// Drops whatever per-peer resources were opened for `peer_ip`.
    fn release(&self, peer_ip: &str);
}

/// UDP transport with one connected socket per peer.
pub struct UdpTransport {
    port: u16,
    links: DashMap<String, Arc<UdpSocket>>,
}

impl UdpTransport {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            links: DashMap::new(),
        }
    }

    pub fn open_links(&self) -> usize {
        self.links.len()
    }

    async fn link(&self, peer_ip: &str) -> Result<Arc<UdpSocket>> {
        if let Some(socket) = self.links.get(peer_ip) {
            return Ok(socket.value().clone());
        }

        let ip: IpAddr = peer_ip
            .parse()
            .with_context(|| format!("invalid peer address {:?}", peer_ip))?;
        let local = match ip {
            IpAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            IpAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(SocketAddr::new(ip, self.port)).await?;
        tracing::debug!("Opened link to {}:{}", peer_ip, self.port);

        let socket = self
            .links
            .entry(peer_ip.to_string())
            .or_insert_with(|| Arc::new(socket))
            .value()
            .clone();
        Ok(socket)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, peer_ip: &str, frame: &[u8]) -> Result<()> {
        let socket = self.link(peer_ip).await?;
        socket.send(frame).await?;
        Ok(())
    }

    fn release(&self, peer_ip: &str) {
        if self.links.remove(peer_ip).is_some() {
            tracing::debug!("Released link to {}", peer_ip);
        }
    }
}
