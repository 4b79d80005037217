use crate::model::participant::ParticipantId;
use crate::model::role::Role;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(urls: Vec<String>) -> Self {
        Self {
            urls,
            username: None,
            credential: None,
        }
    }
}

/// ICE candidate in the JSON shape browsers produce with `candidate.toJSON()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

/// Frames a participant sends to the relay.
///
/// None of them carries a sender field: the relay stamps the connection's own
/// identity on everything it forwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientSignal {
    JoinRoom {
        room_id: RoomId,
        role: Role,
    },
    LeaveRoom,
    /// Ask for an offer. Without a target it goes to every broadcaster of the
    /// sender's room, or waits in the room until one joins.
    RequestOffer {
        #[serde(default)]
        target: Option<ParticipantId>,
    },
    Offer {
        target: ParticipantId,
        sdp: String,
    },
    Answer {
        target: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        target: ParticipantId,
        candidate: IceCandidate,
    },
}

/// Frames the relay delivers to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerSignal {
    Welcome {
        participant_id: ParticipantId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Joined {
        room_id: RoomId,
        participant_id: ParticipantId,
    },
    UserJoined {
        participant: ParticipantId,
        role: Role,
    },
    UserLeft {
        participant: ParticipantId,
    },
    RequestOffer {
        from: ParticipantId,
    },
    Offer {
        from: ParticipantId,
        sdp: String,
    },
    Answer {
        from: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        from: ParticipantId,
        candidate: IceCandidate,
    },
}

impl ServerSignal {
    /// Short name used in logs; matches the wire `op`.
    pub fn op(&self) -> &'static str {
        match self {
            ServerSignal::Welcome { .. } => "welcome",
            ServerSignal::IceConfig { .. } => "ice-config",
            ServerSignal::Joined { .. } => "joined",
            ServerSignal::UserJoined { .. } => "user-joined",
            ServerSignal::UserLeft { .. } => "user-left",
            ServerSignal::RequestOffer { .. } => "request-offer",
            ServerSignal::Offer { .. } => "offer",
            ServerSignal::Answer { .. } => "answer",
            ServerSignal::IceCandidate { .. } => "ice-candidate",
        }
    }
}
