//! Error types for the session layer.

use cardroom_protocol::RoomId;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A room with this id already exists. The existing session is
    /// untouched.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The event referenced a room that doesn't exist. The event is
    /// dropped; the originating connection stays open.
    #[error("no such room: {0}")]
    NoSuchRoom(RoomId),

    /// The dispatcher task is gone (server shutting down).
    #[error("registry unavailable")]
    Unavailable,
}
