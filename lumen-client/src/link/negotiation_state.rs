use std::fmt;

/// Which side of the offer/answer exchange a link plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Offerer,
    Answerer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    AnswerReceived,
    OfferReceived,
    AnswerSent,
    Connected,
    Closed,
}

impl NegotiationState {
    pub fn is_closed(self) -> bool {
        self == NegotiationState::Closed
    }

    /// Whether a connectivity report may move the link to `Connected`.
    pub fn awaits_connectivity(self) -> bool {
        matches!(
            self,
            NegotiationState::AnswerReceived | NegotiationState::AnswerSent
        )
    }

    /// Whether an inbound offer is acceptable in this state.
    ///
    /// An offer while our own offer is outstanding is a collision; the
    /// broadcaster-always-offers policy means it never happens legitimately.
    pub fn accepts_offer(self) -> bool {
        !matches!(self, NegotiationState::OfferSent | NegotiationState::Closed)
    }

    pub fn accepts_answer(self) -> bool {
        self == NegotiationState::OfferSent
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationState::Idle => "idle",
            NegotiationState::OfferSent => "offer-sent",
            NegotiationState::AnswerReceived => "answer-received",
            NegotiationState::OfferReceived => "offer-received",
            NegotiationState::AnswerSent => "answer-sent",
            NegotiationState::Connected => "connected",
            NegotiationState::Closed => "closed",
        };
        f.write_str(name)
    }
}
