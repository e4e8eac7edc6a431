//! Unified error type for the Cardroom server.

use cardroom_protocol::ProtocolError;
use cardroom_session::RegistryError;
use cardroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CardroomError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (duplicate room, routing miss, shutdown).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error from the HTTP listener.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
