use crate::link::NegotiationState;
use thiserror::Error;

/// Why a capture attempt produced no usable tracks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture denied: {0}")]
    Denied(String),

    #[error("capture produced no tracks")]
    NoTracks,
}

/// Failure that ends negotiation on a single link.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("unexpected '{signal}' while {state}")]
    UnexpectedSignal {
        state: NegotiationState,
        signal: &'static str,
    },

    #[error("transport error: {0:#}")]
    Transport(#[from] anyhow::Error),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}
