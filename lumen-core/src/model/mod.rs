mod participant;
mod role;
mod room;
mod signaling;

pub use participant::{ParseIdError, ParticipantId};
pub use role::Role;
pub use room::RoomId;
pub use signaling::{ClientSignal, IceCandidate, IceServerConfig, ServerSignal};
