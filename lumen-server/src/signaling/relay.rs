use crate::room::RoomRegistry;
use dashmap::DashMap;
use lumen_core::{ClientSignal, IceServerConfig, ParticipantId, RoomId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

struct RelayInner {
    connections: DashMap<ParticipantId, mpsc::UnboundedSender<ServerSignal>>,
    registry: RoomRegistry,
    ice_servers: Vec<IceServerConfig>,
}

/// Routes negotiation frames between connected participants.
///
/// The relay only looks at addressing: a room for announcements, a target for
/// everything else. Delivery is fire-and-forget; frames for participants that
/// are gone are dropped without telling the sender.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

impl Relay {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                connections: DashMap::new(),
                registry: RoomRegistry::new(),
                ice_servers,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Registers a new connection under a fresh identity and greets it.
    pub fn connect(&self, tx: mpsc::UnboundedSender<ServerSignal>) -> ParticipantId {
        let participant = ParticipantId::new();
        self.inner.connections.insert(participant.clone(), tx);

        self.send_to_participant(
            &participant,
            ServerSignal::Welcome {
                participant_id: participant.clone(),
            },
        );
        self.send_to_participant(
            &participant,
            ServerSignal::IceConfig {
                ice_servers: self.ice_servers(),
            },
        );

        participant
    }

    /// Drops the connection and its room membership.
    pub fn disconnect(&self, participant: &ParticipantId) {
        self.inner.connections.remove(participant);
        self.leave_room(participant);
    }

    /// Relays one inbound frame, stamping `sender` as its origin.
    pub fn handle(&self, sender: &ParticipantId, signal: ClientSignal) {
        match signal {
            ClientSignal::JoinRoom { room_id, role } => {
                info!("{} joins '{}' as {}", sender, room_id, role);
                let outcome = self.registry().join(sender, &room_id, role);

                if let Some(previous) = outcome.previous_room {
                    self.announce_departure(sender, &previous);
                }

                self.send_to_participant(
                    sender,
                    ServerSignal::Joined {
                        room_id: room_id.clone(),
                        participant_id: sender.clone(),
                    },
                );
                self.broadcast_to_room(
                    sender,
                    &room_id,
                    ServerSignal::UserJoined {
                        participant: sender.clone(),
                        role,
                    },
                );

                for requester in outcome.pending_offer_requests {
                    debug!("Handing parked offer request from {} to {}", requester, sender);
                    self.send_to_participant(sender, ServerSignal::RequestOffer { from: requester });
                }
            }

            ClientSignal::LeaveRoom => self.leave_room(sender),

            ClientSignal::RequestOffer { target: Some(target) } => {
                self.send_to_participant(
                    &target,
                    ServerSignal::RequestOffer {
                        from: sender.clone(),
                    },
                );
            }

            ClientSignal::RequestOffer { target: None } => {
                for broadcaster in self.registry().request_offer(sender) {
                    self.send_to_participant(
                        &broadcaster,
                        ServerSignal::RequestOffer {
                            from: sender.clone(),
                        },
                    );
                }
            }

            ClientSignal::Offer { target, sdp } => {
                self.send_to_participant(
                    &target,
                    ServerSignal::Offer {
                        from: sender.clone(),
                        sdp,
                    },
                );
            }

            ClientSignal::Answer { target, sdp } => {
                self.send_to_participant(
                    &target,
                    ServerSignal::Answer {
                        from: sender.clone(),
                        sdp,
                    },
                );
            }

            ClientSignal::IceCandidate { target, candidate } => {
                self.send_to_participant(
                    &target,
                    ServerSignal::IceCandidate {
                        from: sender.clone(),
                        candidate,
                    },
                );
            }
        }
    }

    /// Delivers `signal` to every current member of `room_id` except `sender`.
    pub fn broadcast_to_room(&self, sender: &ParticipantId, room_id: &RoomId, signal: ServerSignal) {
        for member in self.registry().members_of(room_id) {
            if &member != sender {
                self.send_to_participant(&member, signal.clone());
            }
        }
    }

    /// Delivers `signal` to `target` if it is still connected.
    pub fn send_to_participant(&self, target: &ParticipantId, signal: ServerSignal) {
        let op = signal.op();

        let Some(connection) = self.inner.connections.get(target) else {
            debug!("Dropping '{}' for disconnected participant {}", op, target);
            return;
        };

        if connection.send(signal).is_err() {
            debug!("Connection of {} is closing, dropped '{}'", target, op);
        }
    }

    fn leave_room(&self, participant: &ParticipantId) {
        if let Some(room_id) = self.registry().leave(participant) {
            self.announce_departure(participant, &room_id);
        }
    }

    fn announce_departure(&self, participant: &ParticipantId, room_id: &RoomId) {
        info!("{} left '{}'", participant, room_id);
        self.broadcast_to_room(
            participant,
            room_id,
            ServerSignal::UserLeft {
                participant: participant.clone(),
            },
        );
    }
}
