//! The room registry: every live session in the process, keyed by room id.

use std::collections::HashMap;

use cardroom_protocol::RoomId;
use serde::{Deserialize, Serialize};

use crate::{Envelope, RegistryError, Session};

/// A lightweight room summary for discovery listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    #[serde(rename = "roomid")]
    pub room_id: RoomId,
    #[serde(rename = "playerCount")]
    pub player_count: usize,
}

/// Maps room ids to [`Session`]s.
///
/// Rooms are created explicitly and never torn down — an abandoned room
/// persists for the life of the process. The registry itself is owned by
/// the dispatcher task; nothing else touches it.
#[derive(Default)]
pub struct Registry {
    sessions: HashMap<RoomId, Session>,
    /// Insertion order of `sessions` keys, the order listings use.
    order: Vec<RoomId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room with an empty session in its lobby.
    ///
    /// # Errors
    /// Returns [`RegistryError::AlreadyExists`] without touching the
    /// existing session if the id is taken.
    pub fn create(&mut self, room_id: RoomId) -> Result<(), RegistryError> {
        if self.sessions.contains_key(&room_id) {
            return Err(RegistryError::AlreadyExists(room_id));
        }
        self.sessions
            .insert(room_id.clone(), Session::new(room_id.clone()));
        self.order.push(room_id.clone());
        tracing::info!(%room_id, "room created");
        Ok(())
    }

    /// Pure lookup, no side effect.
    pub fn exists(&self, room_id: &RoomId) -> bool {
        self.sessions.contains_key(room_id)
    }

    /// Forwards an envelope to the room's session for processing.
    ///
    /// # Errors
    /// Returns [`RegistryError::NoSuchRoom`] on a miss; the envelope is
    /// dropped and never retried.
    pub fn route(
        &mut self,
        room_id: &RoomId,
        envelope: Envelope,
    ) -> Result<(), RegistryError> {
        let session = self
            .sessions
            .get_mut(room_id)
            .ok_or_else(|| RegistryError::NoSuchRoom(room_id.clone()))?;
        session.process(envelope);
        Ok(())
    }

    /// A snapshot of every room in creation order.
    pub fn summaries(&self) -> Vec<RoomSummary> {
        self.order
            .iter()
            .filter_map(|id| {
                self.sessions.get(id).map(|s| RoomSummary {
                    room_id: id.clone(),
                    player_count: s.player_count(),
                })
            })
            .collect()
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Session> {
        self.sessions.get(room_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectionHandle, Phase, SessionEvent};
    use cardroom_protocol::{ClientEvent, PlayerId};
    use cardroom_transport::ConnectionId;
    use tokio::sync::mpsc;

    fn rid(id: &str) -> RoomId {
        RoomId::new(id)
    }

    fn conn(id: u64) -> ConnectionHandle {
        ConnectionHandle::new(ConnectionId::new(id), mpsc::unbounded_channel().0)
    }

    fn add_player(id: &str, name: &str) -> Envelope {
        Envelope::new(
            conn(1),
            SessionEvent::Client(ClientEvent::AddPlayer {
                new_player: (PlayerId::new(id), name.into()),
            }),
        )
    }

    #[test]
    fn test_create_fresh_room_starts_in_empty_lobby() {
        let mut registry = Registry::new();

        registry.create(rid("R1")).unwrap();

        let session = registry.get(&rid("R1")).unwrap();
        assert_eq!(session.phase(), Phase::Lobby);
        assert_eq!(session.player_count(), 0);
        assert_eq!(session.connection_count(), 0);
    }

    #[test]
    fn test_create_duplicate_reports_failure_and_preserves_state() {
        let mut registry = Registry::new();
        registry.create(rid("R1")).unwrap();
        registry.route(&rid("R1"), add_player("p1", "Alice")).unwrap();

        let result = registry.create(rid("R1"));

        assert!(matches!(result, Err(RegistryError::AlreadyExists(_))));
        // The existing session is untouched.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&rid("R1")).unwrap().player_count(), 1);
    }

    #[test]
    fn test_exists_is_a_pure_lookup() {
        let mut registry = Registry::new();
        assert!(!registry.exists(&rid("R1")));
        registry.create(rid("R1")).unwrap();
        assert!(registry.exists(&rid("R1")));
        // Asking did not create anything.
        assert!(!registry.exists(&rid("R2")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_route_to_missing_room_reports_no_such_room() {
        let mut registry = Registry::new();

        let result = registry.route(&rid("ghost"), add_player("p1", "Alice"));

        assert!(matches!(result, Err(RegistryError::NoSuchRoom(_))));
    }

    #[test]
    fn test_route_reaches_the_right_session() {
        let mut registry = Registry::new();
        registry.create(rid("R1")).unwrap();
        registry.create(rid("R2")).unwrap();

        registry.route(&rid("R2"), add_player("p1", "Alice")).unwrap();

        assert_eq!(registry.get(&rid("R1")).unwrap().player_count(), 0);
        assert_eq!(registry.get(&rid("R2")).unwrap().player_count(), 1);
    }

    #[test]
    fn test_summaries_in_creation_order_with_counts() {
        let mut registry = Registry::new();
        registry.create(rid("beta")).unwrap();
        registry.create(rid("alpha")).unwrap();
        registry.route(&rid("alpha"), add_player("p1", "Alice")).unwrap();

        let summaries = registry.summaries();

        assert_eq!(
            summaries,
            vec![
                RoomSummary { room_id: rid("beta"), player_count: 0 },
                RoomSummary { room_id: rid("alpha"), player_count: 1 },
            ]
        );
    }

    #[test]
    fn test_room_summary_json_shape() {
        let summary = RoomSummary {
            room_id: rid("R1"),
            player_count: 3,
        };
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json, serde_json::json!({"roomid": "R1", "playerCount": 3}));
    }

    #[test]
    fn test_rooms_are_isolated() {
        // A burst of traffic into one room leaves a sibling untouched.
        let mut registry = Registry::new();
        registry.create(rid("busy")).unwrap();
        registry.create(rid("quiet")).unwrap();

        registry.route(&rid("busy"), add_player("p1", "Alice")).unwrap();
        registry
            .route(
                &rid("busy"),
                Envelope::new(
                    conn(1),
                    SessionEvent::Client(ClientEvent::StartGame),
                ),
            )
            .unwrap();

        assert_eq!(registry.get(&rid("busy")).unwrap().phase(), Phase::Playing);
        assert_eq!(registry.get(&rid("quiet")).unwrap().phase(), Phase::Lobby);
    }
}
