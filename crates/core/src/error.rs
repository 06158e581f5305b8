use thiserror::Error;

/// Decode-time failures. A malformed frame is dropped by the caller rather
/// than propagated as a panic or a crash — this type exists so callers have
/// something typed to log and discard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KvQuorumError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown message type {0}")]
    UnknownMessageType(u16),
}
