use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use lumen_core::{IceCandidate, IceServerConfig, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;

/// Outbound tracks shared by every link of a broadcasting session.
pub type LocalTracks = Vec<Arc<dyn TrackLocal + Send + Sync>>;

/// One peer connection, driven by exactly one link.
///
/// `create_offer` and `create_answer` also install the result as the local
/// description. Events (local candidates, connectivity, remote tracks) are
/// pushed into the channel handed to [`TransportFactory::create`].
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_tracks(&self, tracks: &LocalTracks) -> Result<()>;

    async fn create_offer(&self) -> Result<String>;

    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_offer(&self, sdp: String) -> Result<()>;

    async fn set_remote_answer(&self, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: &ParticipantId,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>>;
}
