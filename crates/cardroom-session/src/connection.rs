//! Connection handles, the inbound envelope, and outbound dispatch.
//!
//! A [`ConnectionHandle`] is what a session owns per attached connection:
//! the comparable [`ConnectionId`] plus the sending half of that
//! connection's outbound queue. The receiving half is drained by a writer
//! task in the router, which serializes each event to the wire format.

use std::fmt;

use cardroom_protocol::{ClientEvent, ServerEvent};
use cardroom_transport::ConnectionId;
use tokio::sync::mpsc;

/// Handle to one attached connection.
///
/// Cheap to clone; equality is by connection id. Once a handle has been
/// given to a session, that session is the only party that sends on it.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(
        id: ConnectionId,
        outbound: mpsc::UnboundedSender<ServerEvent>,
    ) -> Self {
        Self { id, outbound }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends one event to this connection, fire-and-forget.
    ///
    /// A send to a connection whose writer has already gone away is
    /// silently dropped — the close notification for that connection is
    /// either already queued or about to be, and the session will learn
    /// about it through the ordinary event flow.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.outbound.send(event);
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionHandle").field(&self.id).finish()
    }
}

/// Fans one event out to every handle, fire-and-forget.
pub fn broadcast<'a>(
    handles: impl IntoIterator<Item = &'a ConnectionHandle>,
    event: &ServerEvent,
) {
    for handle in handles {
        handle.send(event.clone());
    }
}

/// An inbound event paired with the connection it arrived on.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub conn: ConnectionHandle,
    pub event: SessionEvent,
}

impl Envelope {
    pub fn new(conn: ConnectionHandle, event: SessionEvent) -> Self {
        Self { conn, event }
    }
}

/// Everything a session can be asked to process.
///
/// `Closed` and `TransportError` are synthesized by the router — they are
/// never parsed off the wire. Feeding them through the same queue as
/// client events is what keeps disconnect handling ordered with respect
/// to normal traffic: a reconnect's `NEW_CONNECTION` can never overtake
/// the close that preceded it.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A decoded client→server event.
    Client(ClientEvent),
    /// The connection's transport closed.
    Closed,
    /// The connection's transport failed with an error.
    TransportError(String),
}
