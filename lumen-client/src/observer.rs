use crate::error::NegotiationError;
use crate::transport::RemoteTrack;
use async_trait::async_trait;
use lumen_core::{ParticipantId, RoomId};
use tracing::{info, warn};

/// Notifications from the session to whatever renders it.
#[async_trait]
pub trait SessionObserver: Send + Sync + 'static {
    async fn on_joined(&self, _room_id: RoomId, _local: ParticipantId) {}

    async fn on_stream_attached(&self, remote: ParticipantId, track: RemoteTrack);

    async fn on_peer_connected(&self, remote: ParticipantId);

    async fn on_peer_closed(&self, remote: ParticipantId);

    async fn on_negotiation_aborted(&self, remote: ParticipantId, error: &NegotiationError);
}

/// Observer that only logs.
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver;

#[async_trait]
impl SessionObserver for LoggingObserver {
    async fn on_joined(&self, room_id: RoomId, local: ParticipantId) {
        info!("Joined '{}' as {}", room_id, local);
    }

    async fn on_stream_attached(&self, remote: ParticipantId, track: RemoteTrack) {
        info!("{} track '{}' attached from {}", track.kind, track.track_id, remote);
    }

    async fn on_peer_connected(&self, remote: ParticipantId) {
        info!("Connected to {}", remote);
    }

    async fn on_peer_closed(&self, remote: ParticipantId) {
        info!("Link to {} closed", remote);
    }

    async fn on_negotiation_aborted(&self, remote: ParticipantId, error: &NegotiationError) {
        warn!("Negotiation with {} aborted: {}", remote, error);
    }
}
