use lumen_core::IceCandidate;

/// Signals routed by the session manager into one link's mailbox.
#[derive(Debug)]
pub enum LinkCommand {
    RemoteOffer(String),
    RemoteAnswer(String),
    RemoteCandidate(IceCandidate),
    Close,
}

impl LinkCommand {
    pub fn name(&self) -> &'static str {
        match self {
            LinkCommand::RemoteOffer(_) => "offer",
            LinkCommand::RemoteAnswer(_) => "answer",
            LinkCommand::RemoteCandidate(_) => "ice-candidate",
            LinkCommand::Close => "close",
        }
    }
}
