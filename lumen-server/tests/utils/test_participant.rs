use lumen_core::{ClientSignal, ParticipantId, Role, RoomId, ServerSignal};
use lumen_server::Relay;
use tokio::sync::mpsc;

use super::signal_helpers::{SIGNAL_TIMEOUT_MS, drain, recv_within};

/// A relay connection driven directly from a test, without a WebSocket.
pub struct TestParticipant {
    pub id: ParticipantId,
    relay: Relay,
    rx: mpsc::UnboundedReceiver<ServerSignal>,
}

impl TestParticipant {
    /// Connect to the relay and consume the greeting frames.
    pub async fn connect(relay: &Relay) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = relay.connect(tx);
        let mut participant = Self {
            id,
            relay: relay.clone(),
            rx,
        };

        let welcome = participant.expect_signal().await;
        assert_eq!(
            welcome,
            ServerSignal::Welcome {
                participant_id: participant.id.clone()
            }
        );
        let ice = participant.expect_signal().await;
        assert!(matches!(ice, ServerSignal::IceConfig { .. }));

        participant
    }

    pub fn send(&self, signal: ClientSignal) {
        self.relay.handle(&self.id, signal);
    }

    /// Join a room and consume the `joined` acknowledgement.
    pub async fn join(&mut self, room: &str, role: Role) {
        self.send(ClientSignal::JoinRoom {
            room_id: RoomId::from(room),
            role,
        });

        let ack = self.expect_signal().await;
        assert_eq!(
            ack,
            ServerSignal::Joined {
                room_id: RoomId::from(room),
                participant_id: self.id.clone(),
            }
        );
    }

    pub fn disconnect(&self) {
        self.relay.disconnect(&self.id);
    }

    pub async fn expect_signal(&mut self) -> ServerSignal {
        recv_within(&mut self.rx, SIGNAL_TIMEOUT_MS)
            .await
            .unwrap_or_else(|e| panic!("{} expected a signal: {}", self.id, e))
    }

    /// Everything delivered to this participant during the quiet period.
    pub async fn drain(&mut self) -> Vec<ServerSignal> {
        drain(&mut self.rx).await
    }

    pub async fn expect_silence(&mut self) {
        let signals = self.drain().await;
        assert!(
            signals.is_empty(),
            "{} should not have received anything, got {:?}",
            self.id,
            signals
        );
    }
}
