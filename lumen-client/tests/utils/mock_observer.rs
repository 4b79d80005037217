use std::sync::Arc;

use async_trait::async_trait;
use lumen_client::{NegotiationError, RemoteTrack, SessionObserver};
use lumen_core::{ParticipantId, RoomId};
use tokio::sync::Mutex;

use super::signal_helpers::{SIGNAL_TIMEOUT_MS, wait_until};

/// Event types recorded by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Joined { room_id: RoomId, local: ParticipantId },
    StreamAttached { remote: ParticipantId, track: RemoteTrack },
    Connected { remote: ParticipantId },
    Closed { remote: ParticipantId },
    Aborted { remote: ParticipantId, reason: String },
}

/// A SessionObserver that records every notification.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_events(&self) -> Vec<SessionEvent> {
        self.events.lock().await.clone()
    }

    pub async fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events.lock().await.iter().filter(|e| predicate(e)).count()
    }

    /// Wait until at least `n` recorded events match `predicate`.
    pub async fn wait_for(
        &self,
        n: usize,
        predicate: impl Fn(&SessionEvent) -> bool + Clone,
    ) -> bool {
        wait_until(SIGNAL_TIMEOUT_MS, || {
            let observer = self.clone();
            let predicate = predicate.clone();
            async move { observer.count(predicate).await >= n }
        })
        .await
    }

    pub async fn connected_count(&self, remote: &ParticipantId) -> usize {
        self.count(|e| matches!(e, SessionEvent::Connected { remote: id } if id == remote))
            .await
    }

    pub async fn aborts_for(&self, remote: &ParticipantId) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Aborted { remote: id, reason } if id == remote => {
                    Some(reason.clone())
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SessionObserver for RecordingObserver {
    async fn on_joined(&self, room_id: RoomId, local: ParticipantId) {
        self.events
            .lock()
            .await
            .push(SessionEvent::Joined { room_id, local });
    }

    async fn on_stream_attached(&self, remote: ParticipantId, track: RemoteTrack) {
        tracing::info!("[RecordingObserver] stream from {}", remote);
        self.events
            .lock()
            .await
            .push(SessionEvent::StreamAttached { remote, track });
    }

    async fn on_peer_connected(&self, remote: ParticipantId) {
        tracing::info!("[RecordingObserver] connected to {}", remote);
        self.events
            .lock()
            .await
            .push(SessionEvent::Connected { remote });
    }

    async fn on_peer_closed(&self, remote: ParticipantId) {
        tracing::info!("[RecordingObserver] closed {}", remote);
        self.events.lock().await.push(SessionEvent::Closed { remote });
    }

    async fn on_negotiation_aborted(&self, remote: ParticipantId, error: &NegotiationError) {
        tracing::info!("[RecordingObserver] aborted {}: {}", remote, error);
        self.events.lock().await.push(SessionEvent::Aborted {
            remote,
            reason: error.to_string(),
        });
    }
}
