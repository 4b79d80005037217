use crate::capture::{LocalMedia, MediaCapture};
use crate::link::{
    LinkCommand, LinkEnv, LinkHandle, LinkSetup, LinkTable, NegotiationRole, NegotiationState,
    PeerLink,
};
use crate::observer::SessionObserver;
use crate::signaling::SignalSink;
use crate::transport::TransportFactory;
use dashmap::mapref::entry::Entry;
use lumen_core::{ClientSignal, IceServerConfig, ParticipantId, Role, RoomId, ServerSignal};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

/// Collaborators a session is built from.
pub struct SessionParts {
    pub signals: Arc<dyn SignalSink>,
    pub observer: Arc<dyn SessionObserver>,
    pub factory: Arc<dyn TransportFactory>,
    pub capture: Arc<dyn MediaCapture>,
}

/// Owns every [`PeerLink`] of the local participant, keyed by remote identity.
///
/// Relay frames go in through [`PeerSessionManager::on_message`]; links are
/// created on first contact and removed when they close. At most one live
/// link exists per remote participant.
pub struct PeerSessionManager {
    role: RwLock<Role>,
    room: RwLock<Option<RoomId>>,
    local_id: RwLock<Option<ParticipantId>>,
    ice_servers: RwLock<Vec<IceServerConfig>>,
    links: Arc<LinkTable>,
    media: Arc<LocalMedia>,
    env: Arc<LinkEnv>,
    next_generation: AtomicU64,
}

impl PeerSessionManager {
    pub fn new(role: Role, ice_servers: Vec<IceServerConfig>, parts: SessionParts) -> Self {
        let links = Arc::new(LinkTable::new());

        Self {
            role: RwLock::new(role),
            room: RwLock::new(None),
            local_id: RwLock::new(None),
            ice_servers: RwLock::new(ice_servers),
            links: links.clone(),
            media: Arc::new(LocalMedia::new(parts.capture)),
            env: Arc::new(LinkEnv {
                signals: parts.signals,
                observer: parts.observer,
                factory: parts.factory,
                links,
            }),
            next_generation: AtomicU64::new(0),
        }
    }

    pub async fn role(&self) -> Role {
        *self.role.read().await
    }

    pub async fn room(&self) -> Option<RoomId> {
        self.room.read().await.clone()
    }

    /// Identity assigned by the relay, once `welcome` has arrived.
    pub async fn local_id(&self) -> Option<ParticipantId> {
        self.local_id.read().await.clone()
    }

    pub async fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.ice_servers.read().await.clone()
    }

    pub fn link_state(&self, remote: &ParticipantId) -> Option<NegotiationState> {
        self.links.get(remote).map(|handle| handle.value().state())
    }

    pub fn link(&self, remote: &ParticipantId) -> Option<LinkHandle> {
        self.links.get(remote).map(|handle| handle.value().clone())
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Announces the local participant in `room_id`.
    ///
    /// A viewer follows up with an untargeted offer request; the relay hands
    /// it to the room's broadcaster now or whenever one joins.
    pub async fn join_room(&self, room_id: RoomId) {
        let role = self.role().await;
        *self.room.write().await = Some(room_id.clone());

        info!("Joining '{}' as {}", room_id, role);
        self.env
            .signals
            .send(ClientSignal::JoinRoom { room_id, role });

        if !role.is_broadcaster() {
            self.env
                .signals
                .send(ClientSignal::RequestOffer { target: None });
        }
    }

    /// A remote participant showed up in the room.
    ///
    /// A viewer answers a broadcaster's arrival with a targeted offer request,
    /// since its untargeted one may already have gone to an earlier broadcaster.
    pub async fn on_peer_announced(&self, remote: ParticipantId, remote_role: Role) {
        let local_role = self.role().await;

        if local_role.is_broadcaster() && remote_role == Role::Viewer {
            self.open_offerer(remote).await;
        } else if !local_role.is_broadcaster() && remote_role.is_broadcaster() {
            if self.links.get(&remote).is_some_and(|handle| handle.is_live()) {
                debug!("Link to {} already live, not requesting an offer", remote);
                return;
            }
            debug!("Requesting an offer from broadcaster {}", remote);
            self.env.signals.send(ClientSignal::RequestOffer {
                target: Some(remote),
            });
        } else {
            debug!("Not initiating towards {} ({})", remote, remote_role);
        }
    }

    /// Routes one relay frame.
    pub async fn on_message(&self, signal: ServerSignal) {
        match signal {
            ServerSignal::Welcome { participant_id } => {
                info!("Relay assigned identity {}", participant_id);
                *self.local_id.write().await = Some(participant_id);
            }

            ServerSignal::IceConfig { ice_servers } => {
                info!("Received ICE config: {} server(s)", ice_servers.len());
                *self.ice_servers.write().await = ice_servers;
            }

            ServerSignal::Joined {
                room_id,
                participant_id,
            } => {
                self.env.observer.on_joined(room_id, participant_id).await;
            }

            ServerSignal::UserJoined { participant, role } => {
                self.on_peer_announced(participant, role).await;
            }

            ServerSignal::UserLeft { participant } => {
                self.close_link(&participant);
            }

            ServerSignal::RequestOffer { from } => {
                if self.role().await.is_broadcaster() {
                    self.open_offerer(from).await;
                } else {
                    debug!("Viewer ignores offer request from {}", from);
                }
            }

            ServerSignal::Offer { from, sdp } => {
                self.route_offer(from, sdp).await;
            }

            ServerSignal::Answer { from, sdp } => {
                self.route(&from, LinkCommand::RemoteAnswer(sdp));
            }

            ServerSignal::IceCandidate { from, candidate } => {
                self.route(&from, LinkCommand::RemoteCandidate(candidate));
            }
        }
    }

    /// Closes every link and waits for them to finish. Captured media is
    /// released, so the next broadcast captures again.
    pub async fn teardown_all(&self) {
        let remotes: Vec<ParticipantId> =
            self.links.iter().map(|entry| entry.key().clone()).collect();

        let mut closing = Vec::with_capacity(remotes.len());
        for remote in remotes {
            if let Some((_, handle)) = self.links.remove(&remote) {
                handle.send(LinkCommand::Close);
                closing.push(handle);
            }
        }

        if !closing.is_empty() {
            info!("Tearing down {} link(s)", closing.len());
        }
        for handle in closing {
            handle.closed().await;
        }

        self.media.release().await;
    }

    /// Stops negotiating with one participant. Other links are untouched.
    pub fn close_link(&self, remote: &ParticipantId) {
        if let Some((_, handle)) = self.links.remove(remote) {
            debug!("Closing link to {}", remote);
            handle.send(LinkCommand::Close);
        }
    }

    pub async fn switch_room(&self, room_id: RoomId) {
        self.teardown_all().await;
        self.join_room(room_id).await;
    }

    /// Leaves the current room, changes role and joins it again.
    pub async fn switch_role(&self, role: Role) {
        self.teardown_all().await;
        *self.role.write().await = role;

        if let Some(room_id) = self.room().await {
            self.env.signals.send(ClientSignal::LeaveRoom);
            self.join_room(room_id).await;
        }
    }

    /// Feeds relay frames into the session until the connection ends, then
    /// closes every link.
    pub async fn run(&self, mut incoming: mpsc::UnboundedReceiver<ServerSignal>) {
        while let Some(signal) = incoming.recv().await {
            self.on_message(signal).await;
        }

        info!("Relay stream ended, closing session");
        self.teardown_all().await;
    }

    async fn open_offerer(&self, remote: ParticipantId) {
        let setup = self.link_setup(remote, NegotiationRole::Offerer).await;

        match self.links.entry(setup.remote.clone()) {
            Entry::Occupied(entry) if entry.get().is_live() => {
                debug!("Link to {} already live, ignoring announcement", entry.key());
            }
            Entry::Occupied(mut entry) => {
                entry.insert(PeerLink::spawn(setup, self.env.clone()));
            }
            Entry::Vacant(entry) => {
                entry.insert(PeerLink::spawn(setup, self.env.clone()));
            }
        }
    }

    async fn route_offer(&self, remote: ParticipantId, sdp: String) {
        let setup = self.link_setup(remote, NegotiationRole::Answerer).await;

        match self.links.entry(setup.remote.clone()) {
            Entry::Occupied(entry) if entry.get().is_live() => {
                entry.get().send(LinkCommand::RemoteOffer(sdp));
            }
            Entry::Occupied(mut entry) => {
                let handle = PeerLink::spawn(setup, self.env.clone());
                handle.send(LinkCommand::RemoteOffer(sdp));
                entry.insert(handle);
            }
            Entry::Vacant(entry) => {
                let handle = PeerLink::spawn(setup, self.env.clone());
                handle.send(LinkCommand::RemoteOffer(sdp));
                entry.insert(handle);
            }
        }
    }

    fn route(&self, remote: &ParticipantId, cmd: LinkCommand) {
        let Some(handle) = self.links.get(remote) else {
            debug!("No link to {}, dropping '{}'", remote, cmd.name());
            return;
        };
        if !handle.send(cmd) {
            debug!("Link to {} is closing, dropped signal", remote);
        }
    }

    async fn link_setup(&self, remote: ParticipantId, role: NegotiationRole) -> LinkSetup {
        let media = if self.role().await.is_broadcaster() {
            Some(self.media.clone())
        } else {
            None
        };

        LinkSetup {
            remote,
            role,
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            ice_servers: self.ice_servers().await,
            media,
        }
    }
}
