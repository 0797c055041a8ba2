use async_trait::async_trait;
use tokio::sync::broadcast;

use super::MessageBus;
use super::types::{BusMessage, Envelope};

const CHANNEL_CAPACITY: usize = 1024;

/// In-process bus. Publishing with no subscribers is not an error.
pub struct LocalBus {
    channel: u16,
    sender: broadcast::Sender<Envelope>,
}

impl LocalBus {
    pub fn new(channel: u16) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel, sender }
    }

    /// Delivers an already-stamped envelope, e.g. one received from the network.
    pub fn deliver(&self, envelope: Envelope) {
        let _ = self.sender.send(envelope);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    fn channel(&self) -> u16 {
        self.channel
    }

    async fn publish(&self, message: BusMessage) -> anyhow::Result<()> {
        self.deliver(Envelope::new(self.channel, message));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }
}
