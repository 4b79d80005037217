use lumen_core::IceCandidate;

/// Connectivity as reported by the underlying peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl Connectivity {
    /// States after which the link cannot carry media any more.
    ///
    /// `Disconnected` is not one of them: ICE may still recover from it.
    pub fn is_lost(self) -> bool {
        matches!(self, Connectivity::Failed | Connectivity::Closed)
    }
}

/// Inbound media track announced by the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub stream_id: String,
    pub track_id: String,
    pub kind: String,
}

pub enum TransportEvent {
    CandidateGenerated(IceCandidate),
    ConnectivityChanged(Connectivity),
    TrackReceived(RemoteTrack),
}
