//! The dispatcher: a single task that owns the [`Registry`] and applies
//! every inbound event in arrival order.
//!
//! All traffic — decoded frames from every connection, synthesized closes,
//! HTTP create/exists/list requests — funnels through one unbounded queue
//! into one task. That single queue is the whole concurrency story: no
//! session transition can interleave with another, no broadcast can
//! observe a half-applied mutation, and registry insertion is mutually
//! exclusive with lookup.

use cardroom_protocol::RoomId;
use tokio::sync::{mpsc, oneshot};

use crate::{Envelope, Registry, RegistryError, RoomSummary};

/// Commands accepted by the dispatcher task.
enum RegistryCommand {
    /// Create a room.
    Create {
        room_id: RoomId,
        reply: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Existence check.
    Exists {
        room_id: RoomId,
        reply: oneshot::Sender<bool>,
    },

    /// Room listing snapshot.
    List {
        reply: oneshot::Sender<Vec<RoomSummary>>,
    },

    /// Forward an envelope to a room.
    Route {
        room_id: RoomId,
        envelope: Envelope,
        reply: oneshot::Sender<Result<(), RegistryError>>,
    },
}

/// Handle to the running dispatcher. Cheap to clone; every connection
/// task and HTTP handler holds one.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::UnboundedSender<RegistryCommand>,
}

impl RegistryHandle {
    /// Creates a room.
    ///
    /// # Errors
    /// [`RegistryError::AlreadyExists`] if the id is taken, or
    /// [`RegistryError::Unavailable`] if the dispatcher is gone.
    pub async fn create(&self, room_id: RoomId) -> Result<(), RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Create {
                room_id,
                reply: reply_tx,
            })
            .map_err(|_| RegistryError::Unavailable)?;
        reply_rx.await.map_err(|_| RegistryError::Unavailable)?
    }

    /// Checks whether a room exists.
    pub async fn exists(&self, room_id: RoomId) -> Result<bool, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Exists {
                room_id,
                reply: reply_tx,
            })
            .map_err(|_| RegistryError::Unavailable)?;
        reply_rx.await.map_err(|_| RegistryError::Unavailable)
    }

    /// Snapshot of every room, creation order.
    pub async fn list(&self) -> Result<Vec<RoomSummary>, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::List { reply: reply_tx })
            .map_err(|_| RegistryError::Unavailable)?;
        reply_rx.await.map_err(|_| RegistryError::Unavailable)
    }

    /// Routes an envelope to a room and reports the outcome.
    ///
    /// # Errors
    /// [`RegistryError::NoSuchRoom`] on a miss — the envelope is dropped,
    /// never retried, and the connection that produced it stays usable.
    pub async fn route(
        &self,
        room_id: RoomId,
        envelope: Envelope,
    ) -> Result<(), RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Route {
                room_id,
                envelope,
                reply: reply_tx,
            })
            .map_err(|_| RegistryError::Unavailable)?;
        reply_rx.await.map_err(|_| RegistryError::Unavailable)?
    }
}

/// The dispatcher task state.
struct RegistryActor {
    registry: Registry,
    receiver: mpsc::UnboundedReceiver<RegistryCommand>,
}

impl RegistryActor {
    async fn run(mut self) {
        tracing::info!("registry dispatcher started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RegistryCommand::Create { room_id, reply } => {
                    let _ = reply.send(self.registry.create(room_id));
                }
                RegistryCommand::Exists { room_id, reply } => {
                    let _ = reply.send(self.registry.exists(&room_id));
                }
                RegistryCommand::List { reply } => {
                    let _ = reply.send(self.registry.summaries());
                }
                RegistryCommand::Route {
                    room_id,
                    envelope,
                    reply,
                } => {
                    let _ =
                        reply.send(self.registry.route(&room_id, envelope));
                }
            }
        }

        tracing::info!("registry dispatcher stopped");
    }
}

/// Spawns the dispatcher task and returns a handle to it.
pub fn spawn_registry() -> RegistryHandle {
    let (tx, rx) = mpsc::unbounded_channel();

    let actor = RegistryActor {
        registry: Registry::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RegistryHandle { sender: tx }
}

// =========================================================================
// Tests
// =========================================================================
