use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{V2vError, V2vResult};

/// Capacity of the queue between the receive loop and the dispatcher.
pub const DISPATCH_QUEUE_CAPACITY: usize = 256;

/// One inbound datagram and who sent it.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    pub sender: SocketAddr,
}

/// Binds the receive socket. Failure here is the one unrecoverable condition.
pub async fn bind(addr: SocketAddr) -> V2vResult<UdpSocket> {
    UdpSocket::bind(addr)
        .await
        .map_err(|source| V2vError::Bind { addr, source })
}

pub fn dispatch_queue() -> (mpsc::Sender<Datagram>, mpsc::Receiver<Datagram>) {
    mpsc::channel(DISPATCH_QUEUE_CAPACITY)
}

/// Reads datagrams forever, handing each to `queue` without waiting.
///
/// A full queue drops the datagram; the loop ends when the queue is closed.
pub async fn receive_loop(socket: Arc<UdpSocket>, queue: mpsc::Sender<Datagram>) {
    let mut buf = vec![0u8; 65536];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, sender)) => {
                let datagram = Datagram {
                    bytes: buf[..len].to_vec(),
                    sender,
                };

                match queue.try_send(datagram) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("Dispatch queue full, dropping datagram from {}", sender);
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::info!("Dispatch queue closed, stopping receive loop");
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to receive UDP packet: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
