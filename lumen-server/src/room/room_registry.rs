use crate::room::Room;
use dashmap::DashMap;
use lumen_core::{ParticipantId, Role, RoomId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of [`RoomRegistry::join`].
#[derive(Debug, Default)]
pub struct JoinOutcome {
    /// Room the participant was moved out of, if it was in a different one.
    pub previous_room: Option<RoomId>,
    /// Offer requests parked in the room, handed over to a joining broadcaster.
    pub pending_offer_requests: Vec<ParticipantId>,
}

/// In-memory map of which participant sits in which room.
///
/// Every mutation of a room happens while its `DashMap` entry is locked, so a
/// join never interleaves with a fan-out snapshot of the same room. A
/// participant is a member of at most one room at a time.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Room>>,
    memberships: Arc<DashMap<ParticipantId, RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, participant: &ParticipantId, room_id: &RoomId, role: Role) -> JoinOutcome {
        let previous_room = match self.room_of(participant) {
            Some(current) if &current == room_id => None,
            Some(_) => self.leave(participant),
            None => None,
        };

        let pending_offer_requests = {
            let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
                info!("Creating room '{}'", room_id);
                Room::default()
            });
            room.insert(participant.clone(), role);

            if role.is_broadcaster() {
                room.take_offer_requests()
            } else {
                Vec::new()
            }
        };

        self.memberships.insert(participant.clone(), room_id.clone());
        debug!("{} joined '{}' as {}", participant, room_id, role);

        JoinOutcome {
            previous_room,
            pending_offer_requests,
        }
    }

    /// Removes the participant from its room and returns that room.
    pub fn leave(&self, participant: &ParticipantId) -> Option<RoomId> {
        let (_, room_id) = self.memberships.remove(participant)?;

        if let Some(mut room) = self.rooms.get_mut(&room_id) {
            room.remove(participant);
        }

        if self
            .rooms
            .remove_if(&room_id, |_, room| room.is_empty())
            .is_some()
        {
            info!("Room '{}' is empty, dropping it", room_id);
        }

        debug!("{} left '{}'", participant, room_id);
        Some(room_id)
    }

    pub fn members_of(&self, room_id: &RoomId) -> HashSet<ParticipantId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_of(&self, participant: &ParticipantId) -> Option<RoomId> {
        self.memberships
            .get(participant)
            .map(|entry| entry.value().clone())
    }

    pub fn role_of(&self, participant: &ParticipantId) -> Option<Role> {
        let room_id = self.room_of(participant)?;
        self.rooms.get(&room_id)?.role_of(participant)
    }

    /// Resolves an untargeted offer request to the broadcasters currently in
    /// the requester's room. With no broadcaster present the request is parked
    /// and handed to the next broadcaster that joins.
    pub fn request_offer(&self, requester: &ParticipantId) -> Vec<ParticipantId> {
        let Some(room_id) = self.room_of(requester) else {
            return Vec::new();
        };
        let Some(mut room) = self.rooms.get_mut(&room_id) else {
            return Vec::new();
        };

        let broadcasters: Vec<_> = room
            .broadcasters()
            .into_iter()
            .filter(|id| id != requester)
            .collect();

        if broadcasters.is_empty() {
            debug!("No broadcaster in '{}' yet, parking offer request from {}", room_id, requester);
            room.park_offer_request(requester.clone());
        }

        broadcasters
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
