use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};

use super::heartbeat::HeartbeatMonitor;
use super::types::{PlatoonSnapshot, Role, RoleSlot, SlotState};
use crate::bus::MessageBus;
use crate::bus::types::{BusMessage, VehicleSignal, now_ms};
use crate::config::VehicleConfig;
use crate::error::{V2vError, V2vResult};
use crate::presence::service::PresenceService;
use crate::telemetry::MotionTelemetry;
use crate::transport::sender::Transport;
use crate::wire::messages::{
    FollowRequest, FollowResponse, FollowerStatus, LeaderStatus, ProtocolMessage, StopFollow,
};

/// Owns both role slots and every transition between their states.
///
/// Each slot sits behind its own lock. Transitions decide and mutate under that lock,
/// then release it before anything is sent, so a slow send never blocks the dispatcher
/// or the tick. No code path holds both slot locks at once.
pub struct PlatoonService {
    config: VehicleConfig,
    leader: Mutex<RoleSlot>,
    follower: Mutex<RoleSlot>,
    monitor: HeartbeatMonitor,
    follow_group: RwLock<Option<String>>,
    telemetry: RwLock<MotionTelemetry>,
    presence: Arc<PresenceService>,
    transport: Arc<dyn Transport>,
    internal: Arc<dyn MessageBus>,
}

impl PlatoonService {
    pub fn new(
        config: VehicleConfig,
        presence: Arc<PresenceService>,
        transport: Arc<dyn Transport>,
        internal: Arc<dyn MessageBus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            monitor: HeartbeatMonitor::new(config.time_diff),
            follow_group: RwLock::new(config.follow_group.clone()),
            config,
            leader: Mutex::new(RoleSlot::new(Role::Leader)),
            follower: Mutex::new(RoleSlot::new(Role::Follower)),
            telemetry: RwLock::new(MotionTelemetry::default()),
            presence,
            transport,
            internal,
        })
    }

    fn slot(&self, role: Role) -> &Mutex<RoleSlot> {
        match role {
            Role::Leader => &self.leader,
            Role::Follower => &self.follower,
        }
    }

    pub async fn snapshot(&self) -> PlatoonSnapshot {
        let leader = self.leader.lock().await.snapshot();
        let follower = self.follower.lock().await.snapshot();
        PlatoonSnapshot { leader, follower }
    }

    pub async fn follow_group(&self) -> Option<String> {
        self.follow_group.read().await.clone()
    }

    pub async fn set_follow_group(&self, group_id: Option<String>) {
        let mut current = self.follow_group.write().await;
        if *current != group_id {
            tracing::info!("Follow target changed: {:?} -> {:?}", *current, group_id);
            *current = group_id;
        }
    }

    pub async fn telemetry(&self) -> MotionTelemetry {
        *self.telemetry.read().await
    }

    // ============================================================
    // LEADER SLOT (the vehicle we follow)
    // ============================================================

    /// `Idle -> Requesting`: asks `target_ip` to let us follow it.
    pub async fn send_follow_request(&self, target_ip: &str, now: Instant) -> V2vResult<()> {
        {
            let mut slot = self.leader.lock().await;
            if !slot.is_idle() {
                return Err(V2vError::GuardRejected {
                    role: Role::Leader,
                    state: slot.state,
                    action: "follow request",
                });
            }
            if target_ip == self.config.ip {
                return Err(V2vError::GuardRejected {
                    role: Role::Leader,
                    state: slot.state,
                    action: "follow request to self",
                });
            }

            // Heartbeat starts now so the request itself can time out.
            slot.occupy(target_ip, SlotState::Requesting, now);
        }

        tracing::info!("Requesting to follow {}", target_ip);
        self.send(target_ip, ProtocolMessage::follow_request()).await;
        Ok(())
    }

    /// `Requesting -> Established` once the requested peer answers.
    pub async fn on_follow_response(
        &self,
        from_ip: &str,
        response: FollowResponse,
        now: Instant,
    ) -> V2vResult<()> {
        {
            let mut slot = self.leader.lock().await;
            if slot.state != SlotState::Requesting {
                return Err(V2vError::GuardRejected {
                    role: Role::Leader,
                    state: slot.state,
                    action: "follow response",
                });
            }
            if !slot.is_peer(from_ip) {
                return Err(V2vError::PeerMismatch {
                    expected: slot.peer_ip.clone(),
                    actual: from_ip.to_string(),
                });
            }

            slot.state = SlotState::Established;
            slot.last_heartbeat = Some(now);
        }

        tracing::info!("Now following {}", from_ip);
        self.mirror(ProtocolMessage::FollowResponse(response)).await;
        Ok(())
    }

    /// Refreshes the leader heartbeat from a `LeaderStatus`.
    pub async fn on_leader_status(
        &self,
        from_ip: &str,
        status: LeaderStatus,
        now: Instant,
    ) -> V2vResult<()> {
        self.record_heartbeat(Role::Leader, from_ip, now).await?;

        tracing::debug!(
            "LeaderStatus from {}: speed={} angle={} distance={}",
            from_ip,
            status.speed,
            status.steering_angle,
            status.distance_traveled
        );
        self.mirror(ProtocolMessage::LeaderStatus(status)).await;
        Ok(())
    }

    // ============================================================
    // FOLLOWER SLOT (the vehicle following us)
    // ============================================================

    /// `Idle -> Established`: the first requester wins, later ones are ignored.
    pub async fn on_follow_request(
        &self,
        from_ip: &str,
        request: FollowRequest,
        now: Instant,
    ) -> V2vResult<()> {
        {
            let mut slot = self.follower.lock().await;
            if !slot.is_idle() {
                return Err(V2vError::GuardRejected {
                    role: Role::Follower,
                    state: slot.state,
                    action: "follow request",
                });
            }

            slot.occupy(from_ip, SlotState::Established, now);
        }

        tracing::info!("Accepted {} as follower", from_ip);
        self.mirror(ProtocolMessage::FollowRequest(request)).await;
        self.send(from_ip, ProtocolMessage::follow_response()).await;
        Ok(())
    }

    /// Refreshes the follower heartbeat from a `FollowerStatus`.
    pub async fn on_follower_status(
        &self,
        from_ip: &str,
        status: FollowerStatus,
        now: Instant,
    ) -> V2vResult<()> {
        self.record_heartbeat(Role::Follower, from_ip, now).await?;

        tracing::debug!("FollowerStatus from {}", from_ip);
        self.mirror(ProtocolMessage::FollowerStatus(status)).await;
        Ok(())
    }

    // ============================================================
    // TEARDOWN
    // ============================================================

    /// Locally initiated teardown: the slot goes `Idle` and its peer gets a `StopFollow`.
    ///
    /// Calling this on an `Idle` slot is rejected and sends nothing.
    pub async fn stop_follow(&self, role: Role) -> V2vResult<()> {
        let peer = {
            let mut slot = self.slot(role).lock().await;
            if slot.is_idle() {
                return Err(V2vError::GuardRejected {
                    role,
                    state: slot.state,
                    action: "stop follow",
                });
            }
            slot.reset()
        };

        if let Some(peer_ip) = peer {
            tracing::info!("Stopping {:?} pairing with {}", role, peer_ip);
            self.send(&peer_ip, ProtocolMessage::stop_follow()).await;
            self.release_if_unused(&peer_ip).await;
        }
        Ok(())
    }

    /// Remote teardown: clears every slot `from_ip` occupies. Nothing is sent back.
    pub async fn on_stop_follow(&self, from_ip: &str, stop: StopFollow) -> V2vResult<()> {
        let mut cleared = Vec::new();

        for role in [Role::Leader, Role::Follower] {
            let mut slot = self.slot(role).lock().await;
            if !slot.is_idle() && slot.is_peer(from_ip) {
                slot.reset();
                cleared.push(role);
            }
        }

        if cleared.is_empty() {
            return Err(V2vError::PeerMismatch {
                expected: None,
                actual: from_ip.to_string(),
            });
        }

        tracing::info!("{} stopped the pairing ({:?} cleared)", from_ip, cleared);
        self.release_if_unused(from_ip).await;
        self.mirror(ProtocolMessage::StopFollow(stop)).await;
        Ok(())
    }

    /// Tears down every slot whose peer has been silent for too long.
    ///
    /// The leader slot is checked while `Requesting` as well, so an unanswered request
    /// eventually frees the slot. Returns the roles that were torn down.
    pub async fn check_heartbeats(&self, now: Instant) -> Vec<Role> {
        let mut lost = Vec::new();

        for role in [Role::Follower, Role::Leader] {
            let peer = {
                let mut slot = self.slot(role).lock().await;
                let watched = match role {
                    Role::Leader => !slot.is_idle(),
                    Role::Follower => slot.state == SlotState::Established,
                };
                if !watched || !self.monitor.is_lost(&slot, now) {
                    continue;
                }
                slot.reset()
            };

            if let Some(peer_ip) = peer {
                tracing::warn!(
                    "{:?} {} lost: silent for at least {:?}",
                    role,
                    peer_ip,
                    self.monitor.time_diff()
                );
                self.send(&peer_ip, ProtocolMessage::stop_follow()).await;
                self.release_if_unused(&peer_ip).await;
                lost.push(role);
            }
        }

        lost
    }

    async fn record_heartbeat(&self, role: Role, from_ip: &str, now: Instant) -> V2vResult<()> {
        let mut slot = self.slot(role).lock().await;
        if slot.state != SlotState::Established {
            return Err(V2vError::GuardRejected {
                role,
                state: slot.state,
                action: "status",
            });
        }
        if !slot.is_peer(from_ip) {
            return Err(V2vError::PeerMismatch {
                expected: slot.peer_ip.clone(),
                actual: from_ip.to_string(),
            });
        }

        slot.last_heartbeat = Some(now);
        Ok(())
    }

    // ============================================================
    // PERIODIC DUTIES
    // ============================================================

    /// Announces this vehicle on the discovery channel, but only while both slots are idle.
    pub async fn announce_presence(&self) -> Result<bool> {
        if !self.snapshot().await.is_idle() {
            return Ok(false);
        }

        self.presence.broadcast().await?;
        Ok(true)
    }

    /// Sends a `FollowRequest` to the registry address of the configured follow group.
    ///
    /// A no-op when no group is configured, the group has not been seen yet, or the
    /// leader slot is already busy.
    pub async fn request_configured_leader(&self, now: Instant) -> bool {
        let Some(group_id) = self.follow_group().await else {
            return false;
        };
        let Some(target_ip) = self.presence.lookup(&group_id) else {
            tracing::trace!("Group {} not discovered yet", group_id);
            return false;
        };

        match self.send_follow_request(&target_ip, now).await {
            Ok(()) => true,
            Err(e) => {
                tracing::trace!("Follow request skipped: {}", e);
                false
            }
        }
    }

    /// `LeaderStatus` downstream with the latest telemetry, if someone follows us.
    pub async fn send_leader_status(&self) -> bool {
        let Some(follower_ip) = self.established_peer(Role::Follower).await else {
            return false;
        };

        let telemetry = self.telemetry().await;
        let status = LeaderStatus {
            timestamp_ms: now_ms(),
            speed: telemetry.speed,
            steering_angle: telemetry.steering_angle,
            distance_traveled: telemetry.distance_traveled,
        };

        self.send(&follower_ip, ProtocolMessage::LeaderStatus(status))
            .await;
        true
    }

    /// `FollowerStatus` upstream as a keep-alive, if we follow someone.
    pub async fn send_follower_status(&self) -> bool {
        let Some(leader_ip) = self.established_peer(Role::Leader).await else {
            return false;
        };

        self.send(&leader_ip, ProtocolMessage::follower_status())
            .await;
        true
    }

    /// One round of periodic work: failure detection first, then announcements,
    /// requests and status messages against the resulting state.
    pub async fn tick(&self, now: Instant) {
        self.check_heartbeats(now).await;

        if let Err(e) = self.announce_presence().await {
            tracing::warn!("Failed to announce presence: {}", e);
        }

        self.request_configured_leader(now).await;
        self.send_follower_status().await;
        self.send_leader_status().await;
    }

    async fn established_peer(&self, role: Role) -> Option<String> {
        let slot = self.slot(role).lock().await;
        match slot.state {
            SlotState::Established => slot.peer_ip.clone(),
            _ => None,
        }
    }

    // ============================================================
    // INTERNAL CHANNEL
    // ============================================================

    /// Applies a vehicle signal from the internal channel.
    pub async fn on_vehicle_signal(&self, signal: &VehicleSignal) {
        if let VehicleSignal::LeaderId { group_id } = signal {
            self.set_follow_group(Some(group_id.clone())).await;
            return;
        }

        self.telemetry.write().await.apply(signal);
    }

    // ============================================================
    // BACKGROUND TASKS
    // ============================================================

    pub async fn start(self: Arc<Self>) {
        tracing::info!(
            "Starting platoon service (tick every {:?}, timeout {:?})",
            self.config.tick_period(),
            self.monitor.time_diff()
        );

        let _tick_handle = {
            let service = self.clone();
            tokio::spawn(async move {
                service.tick_loop().await;
            })
        };

        let _signal_handle = {
            let service = self.clone();
            tokio::spawn(async move {
                service.signal_loop().await;
            })
        };
    }

    async fn tick_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.tick_period());

        loop {
            interval.tick().await;
            self.tick(Instant::now()).await;
        }
    }

    async fn signal_loop(self: Arc<Self>) {
        let mut rx = self.internal.subscribe();

        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    if let BusMessage::Vehicle(signal) = envelope.message {
                        self.on_vehicle_signal(&signal).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Internal listener lagged, skipped {} messages", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    // ============================================================
    // OUTBOUND
    // ============================================================

    /// Frames and sends `message` to `peer_ip`, then mirrors it. Failures are logged, not retried.
    async fn send(&self, peer_ip: &str, message: ProtocolMessage) {
        match message.to_frame() {
            Ok(frame) => {
                if let Err(e) = self.transport.send(peer_ip, &frame).await {
                    tracing::warn!("Failed to send {} to {}: {}", message.name(), peer_ip, e);
                } else {
                    tracing::debug!("Sent {} to {}", message.name(), peer_ip);
                }
            }
            Err(e) => {
                tracing::error!("Failed to encode {}: {}", message.name(), e);
                return;
            }
        }

        self.mirror(message).await;
    }

    async fn mirror(&self, message: ProtocolMessage) {
        if let Err(e) = self.internal.publish(BusMessage::Protocol(message)).await {
            tracing::warn!("Failed to mirror message: {}", e);
        }
    }

    /// Closes the outbound link to `peer_ip` unless the other slot still uses it.
    async fn release_if_unused(&self, peer_ip: &str) {
        let snapshot = self.snapshot().await;
        let in_use = [snapshot.leader, snapshot.follower]
            .iter()
            .any(|slot| slot.peer_ip.as_deref() == Some(peer_ip));

        if !in_use {
            self.transport.release(peer_ip);
        }
    }
}
