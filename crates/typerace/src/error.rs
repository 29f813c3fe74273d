//! Unified error type for the Typerace server.

use typerace_protocol::ProtocolError;
use typerace_room::RoomError;
use typerace_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TyperaceError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, missing field).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, not creator, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The server configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
