pub use lumen_core::{ParticipantId, Role, RoomId};

pub mod model {
    pub use lumen_core::model::*;
    pub use lumen_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use lumen_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use lumen_client::*;
}
