use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use platoon_v2v::bus::MessageBus;
use platoon_v2v::bus::local::LocalBus;
use platoon_v2v::bus::types::{BusMessage, DISCOVERY_CHANNEL, INTERNAL_CHANNEL};
use platoon_v2v::bus::udp::UdpBroadcastBus;
use platoon_v2v::config::{DEFAULT_DISCOVERY_PORT, DEFAULT_GROUP_ID, DEFAULT_PORT, VehicleConfig};
use platoon_v2v::platoon::dispatcher::Dispatcher;
use platoon_v2v::platoon::service::PlatoonService;
use platoon_v2v::presence::service::PresenceService;
use platoon_v2v::transport::receiver;
use platoon_v2v::transport::sender::UdpTransport;

#[derive(Parser, Debug)]
#[command(name = "platoon-v2v", about = "Vehicle-to-vehicle platooning node")]
struct Args {
    /// This vehicle's IP address, as announced to others
    #[arg(long)]
    ip: String,

    /// Maximum silence from a paired vehicle, in milliseconds
    #[arg(long = "diff")]
    time_diff_ms: u64,

    /// Periodic tick frequency in Hz
    #[arg(long = "freq")]
    frequency_hz: f64,

    /// This vehicle's group id
    #[arg(long, default_value = DEFAULT_GROUP_ID)]
    group: String,

    /// Group id of the vehicle to follow
    #[arg(long)]
    follow: Option<String>,

    /// UDP port for protocol datagrams
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// UDP port for discovery broadcasts
    #[arg(long, default_value_t = DEFAULT_DISCOVERY_PORT)]
    discovery_port: u16,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let config = VehicleConfig::new(
        args.ip,
        args.group,
        args.time_diff_ms,
        args.frequency_hz,
    )?
    .with_follow_group(args.follow)
    .with_port(args.port)
    .with_discovery_port(args.discovery_port);

    tracing::info!(
        "Starting vehicle group {} at {} (timeout {:?}, {} Hz)",
        config.group_id,
        config.ip,
        config.time_diff,
        config.frequency_hz
    );
    if let Some(group) = &config.follow_group {
        tracing::info!("Will follow group {}", group);
    }

    // 1. Receive socket (the only fatal start-up failure):
    let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let socket = receiver::bind(bind_addr)
        .await
        .context("cannot start without the protocol receive socket")?;
    tracing::info!("Listening for protocol datagrams on {}", bind_addr);

    // 2. Buses:
    let discovery = UdpBroadcastBus::bind(DISCOVERY_CHANNEL, config.discovery_port).await?;
    discovery.clone().start();
    let internal = Arc::new(LocalBus::new(INTERNAL_CHANNEL));

    // 3. Presence & role negotiation:
    let presence = PresenceService::new(config.identity(), discovery.clone(), internal.clone());
    presence.clone().start();

    let transport = Arc::new(UdpTransport::new(config.port));
    let platoon = PlatoonService::new(config, presence.clone(), transport, internal.clone());
    platoon.clone().start().await;

    // 4. Receive loop -> dispatch queue -> dispatcher:
    let (queue_tx, queue_rx) = receiver::dispatch_queue();
    let dispatcher = Dispatcher::new(platoon.clone(), presence.clone());
    tokio::spawn(dispatcher.run(queue_rx));
    tokio::spawn(receiver::receive_loop(Arc::new(socket), queue_tx));

    // 5. Mirror of internal traffic:
    let mut mirror = internal.subscribe();
    tokio::spawn(async move {
        loop {
            match mirror.recv().await {
                Ok(envelope) => {
                    if let BusMessage::Protocol(message) = envelope.message {
                        tracing::debug!("[internal] {}", message.name());
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 6. Stats reporter:
    let stats_platoon = platoon.clone();
    let stats_presence = presence.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));

        loop {
            interval.tick().await;
            let snapshot = stats_platoon.snapshot().await;
            tracing::info!(
                "Platoon: leader {:?} {:?}, follower {:?} {:?}, {} groups known",
                snapshot.leader.state,
                snapshot.leader.peer_ip,
                snapshot.follower.state,
                snapshot.follower.peer_ip,
                stats_presence.registry.len()
            );
        }
    });

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
