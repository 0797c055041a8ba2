//! Publish/Subscribe Bus
//!
//! Two logical channels connect a vehicle to the outside world:
//! - **Discovery** (`DISCOVERY_CHANNEL`): carries `AnnouncePresence` broadcasts between vehicles.
//! - **Internal** (`INTERNAL_CHANNEL`): mirrors every protocol message sent or received for
//!   visualization, and carries vehicle signals (IMU, pedal, steering, leader selection) in.
//!
//! The protocol core only needs `publish` and `subscribe`, expressed by the [`MessageBus`] trait.
//!
//! ## Implementations
//! - **`local`**: In-process fan-out over a `tokio::sync::broadcast` channel.
//! - **`udp`**: UDP broadcast on the LAN, used for discovery between vehicles.

pub mod local;
pub mod types;
pub mod udp;

use async_trait::async_trait;
use tokio::sync::broadcast;

use types::{BusMessage, Envelope};

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Channel id stamped on every envelope published through this bus.
    fn channel(&self) -> u16;

    async fn publish(&self, message: BusMessage) -> anyhow::Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<Envelope>;
}
