//! Per-connection router: decode inbound frames, forward them to the
//! right session, synthesize close events.
//!
//! Each accepted connection gets its own task running
//! [`handle_connection`]. The router holds no domain state — it only
//! remembers which room this connection last talked to, so transport
//! close/error can be surfaced to that room as ordinary events. Every
//! session mutation happens on the far side of the registry queue.

use cardroom_protocol::{ClientFrame, Codec, RoomId, ServerEvent};
use cardroom_session::{
    ConnectionHandle, Envelope, RegistryError, RegistryHandle, SessionEvent,
};
use cardroom_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::CardroomError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    registry: RegistryHandle,
    codec: C,
) -> Result<(), CardroomError>
where
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // The handle given to sessions pairs the connection id with the
    // sending half of an outbound queue; the writer task below drains
    // the queue, serializes, and pushes frames onto the socket. Sends
    // stay fire-and-forget for the session no matter what the socket
    // is doing.
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let handle = ConnectionHandle::new(conn_id, outbound_tx);

    spawn_writer(conn.clone(), codec.clone(), outbound_rx);

    // The room this connection most recently routed an event to. Needed
    // because a bare transport close carries no room context of its own.
    let mut current_room: Option<RoomId> = None;

    loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                let frame: ClientFrame = match codec.decode(&data) {
                    Ok(frame) => frame,
                    Err(e) => {
                        // Garbage never reaches a session.
                        tracing::debug!(
                            %conn_id,
                            error = %e,
                            "dropping malformed frame"
                        );
                        continue;
                    }
                };

                let ClientFrame { roomid, event } = frame;
                let envelope =
                    Envelope::new(handle.clone(), SessionEvent::Client(event));

                match registry.route(roomid.clone(), envelope).await {
                    Ok(()) => current_room = Some(roomid),
                    Err(RegistryError::NoSuchRoom(room)) => {
                        // Dropped, not retried; the connection stays open
                        // for a future valid event.
                        tracing::warn!(
                            %conn_id,
                            %room,
                            "dropping event for unknown room"
                        );
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "connection error");
                if let Some(room) = current_room.clone() {
                    let _ = registry
                        .route(
                            room,
                            Envelope::new(
                                handle.clone(),
                                SessionEvent::TransportError(e.to_string()),
                            ),
                        )
                        .await;
                }
                break;
            }
        }
    }

    // Close becomes an ordinary event in the same queue as everything
    // else, so the session sees the disconnect in arrival order relative
    // to any reconnect that follows.
    if let Some(room) = current_room {
        let _ = registry
            .route(room, Envelope::new(handle.clone(), SessionEvent::Closed))
            .await;
    }

    Ok(())
}

/// Spawns the writer task for one connection.
///
/// The task ends when every sender clone is gone — the router's copy
/// drops when `handle_connection` returns, and the session's copy when it
/// processes the close event.
fn spawn_writer<C>(
    conn: WebSocketConnection,
    codec: C,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerEvent>,
) where
    C: Codec,
{
    let conn_id = conn.id();
    tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(
                        %conn_id,
                        error = %e,
                        "failed to encode outbound event"
                    );
                    continue;
                }
            };
            if let Err(e) = conn.send(&bytes).await {
                // A failed send is equivalent to a close notification:
                // the reader side surfaces that to the session, nothing
                // to do here but stop.
                tracing::debug!(%conn_id, error = %e, "outbound send failed");
                break;
            }
        }
    });
}
