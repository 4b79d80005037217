use lumen_core::{ParticipantId, Role};
use std::collections::HashMap;

/// Membership of a single room.
///
/// Only ever touched through the registry while the room's map entry is
/// locked, so a `Room` never has to synchronize on its own.
#[derive(Debug, Default)]
pub struct Room {
    members: HashMap<ParticipantId, Role>,
    /// Viewers that asked for an offer while no broadcaster was present.
    pending_offer_requests: Vec<ParticipantId>,
}

impl Room {
    pub fn insert(&mut self, participant: ParticipantId, role: Role) {
        self.members.insert(participant, role);
    }

    pub fn remove(&mut self, participant: &ParticipantId) -> Option<Role> {
        self.pending_offer_requests.retain(|p| p != participant);
        self.members.remove(participant)
    }

    pub fn role_of(&self, participant: &ParticipantId) -> Option<Role> {
        self.members.get(participant).copied()
    }

    pub fn members(&self) -> impl Iterator<Item = &ParticipantId> {
        self.members.keys()
    }

    pub fn broadcasters(&self) -> Vec<ParticipantId> {
        self.members
            .iter()
            .filter(|(_, role)| role.is_broadcaster())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn park_offer_request(&mut self, requester: ParticipantId) {
        if !self.pending_offer_requests.contains(&requester) {
            self.pending_offer_requests.push(requester);
        }
    }

    pub fn take_offer_requests(&mut self) -> Vec<ParticipantId> {
        std::mem::take(&mut self.pending_offer_requests)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
