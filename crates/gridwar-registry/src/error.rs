//! Error types for the registry layer.

use gridwar_protocol::{RejectReason, SessionId};

/// Errors that can occur while routing to a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The session does not exist.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// Both seats of the session were already taken.
    #[error("session {0} is full")]
    SessionFull(SessionId),

    /// The session's actor has stopped or its queue is closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}

impl RegistryError {
    /// The wire reason reported to the client.
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::NotFound(_) => RejectReason::SessionNotFound,
            Self::SessionFull(_) => RejectReason::SessionFull,
            Self::Unavailable(_) => RejectReason::Unavailable,
        }
    }
}
