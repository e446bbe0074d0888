//! Unified error type for the Gridwar server.

use gridwar_protocol::ProtocolError;
use gridwar_registry::RegistryError;
use gridwar_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Rule violations inside a match never surface here; they are answered
/// to the offending player as events. This type covers the plumbing.
#[derive(Debug, thiserror::Error)]
pub enum GridwarError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (not found, full, unavailable).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
