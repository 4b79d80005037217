mod link_command;
mod negotiation_state;
mod peer_link;

pub use link_command::*;
pub use negotiation_state::*;
pub use peer_link::*;
