//! The per-room session state machine.
//!
//! One [`Session`] exists per room. It owns the player roster, the set of
//! attached connections (players and spectators alike), and the ids of
//! players who dropped mid-game. Every inbound [`Envelope`] is consumed by
//! [`Session::process`]; state mutation and the resulting sends are atomic
//! with respect to each other because the dispatcher applies one envelope
//! at a time.
//!
//! The transition step itself ([`Session::apply`]) performs no I/O — it
//! mutates the session and returns the sends as a list of [`Effect`]s,
//! which keeps the whole machine testable without a live connection.

use std::collections::{HashMap, HashSet};

use cardroom_protocol::{ClientEvent, PlayerId, RoomId, ServerEvent};
use cardroom_transport::ConnectionId;
use rand::Rng;

use crate::{broadcast, ConnectionHandle, Envelope, Player, SessionEvent};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// ```text
/// Lobby ──(START_GAME)──→ Playing ──(player drops)──→ WaitingForReconnect
///                            ↑                                │
///                            └────────(RESUME_GAME)───────────┘
/// ```
///
/// The split exists because `NEW_CONNECTION` has two mutually exclusive
/// response shapes: in the lobby a connection gets the roster; mid-game it
/// gets a player or spectator resync depending on the identity it
/// presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Players are gathering; the roster is still mutable.
    Lobby,
    /// The game is running.
    Playing,
    /// The game is paused on one or more mid-game disconnects.
    WaitingForReconnect,
}

impl Phase {
    pub fn is_lobby(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// True for both game phases — the states where a new connection is
    /// answered with a resync instead of the lobby roster.
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::Playing | Self::WaitingForReconnect)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Playing => write!(f, "Playing"),
            Self::WaitingForReconnect => write!(f, "WaitingForReconnect"),
        }
    }
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// An outbound send produced by a transition.
///
/// Returned from [`Session::apply`] rather than executed inline; the
/// dispatch step resolves targets against the session's attached
/// connections.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send to one connection.
    SendTo(ConnectionId, ServerEvent),
    /// Send to every attached connection, including the sender.
    Broadcast(ServerEvent),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The state machine for one room.
pub struct Session {
    room_id: RoomId,
    phase: Phase,
    /// Roster, keyed by identity token.
    players: HashMap<PlayerId, Player>,
    /// Join order of `players` keys — the order the lobby displays.
    join_order: Vec<PlayerId>,
    /// Every attached connection, spectators included.
    connections: HashMap<ConnectionId, ConnectionHandle>,
    /// Players whose connection dropped while a game was running. A
    /// presented identity in this set is what distinguishes a
    /// reconnecting player from a new spectator.
    disconnected: HashSet<PlayerId>,
}

impl Session {
    /// A new session in the lobby with nobody attached.
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            phase: Phase::Lobby,
            players: HashMap::new(),
            join_order: Vec::new(),
            connections: HashMap::new(),
            disconnected: HashSet::new(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn is_disconnected(&self, id: &PlayerId) -> bool {
        self.disconnected.contains(id)
    }

    /// The roster as `[id, name]` pairs in join order.
    pub fn roster(&self) -> Vec<(PlayerId, String)> {
        self.join_order
            .iter()
            .filter_map(|id| {
                self.players
                    .get(id)
                    .map(|p| (id.clone(), p.name.clone()))
            })
            .collect()
    }

    /// Applies one envelope and executes the resulting sends.
    pub fn process(&mut self, envelope: Envelope) {
        let effects = self.apply(envelope);
        self.dispatch(effects);
    }

    /// The transition step: mutates session state, returns the sends.
    pub fn apply(&mut self, envelope: Envelope) -> Vec<Effect> {
        let Envelope { conn, event } = envelope;
        match event {
            SessionEvent::Client(event) => self.apply_client(conn, event),
            SessionEvent::Closed => self.apply_closed(conn.id()),
            SessionEvent::TransportError(message) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    conn = %conn.id(),
                    %message,
                    "transport error surfaced to room"
                );
                vec![Effect::Broadcast(ServerEvent::Error { message })]
            }
        }
    }

    /// Executes effects against the currently attached connections.
    pub fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SendTo(conn_id, event) => {
                    if let Some(handle) = self.connections.get(&conn_id) {
                        handle.send(event);
                    }
                }
                Effect::Broadcast(event) => {
                    broadcast(self.connections.values(), &event);
                }
            }
        }
    }

    // -- transitions --------------------------------------------------------

    fn apply_client(
        &mut self,
        conn: ConnectionHandle,
        event: ClientEvent,
    ) -> Vec<Effect> {
        match (self.phase, event) {
            (_, ClientEvent::NewConnection { player_id }) => {
                self.on_new_connection(conn, player_id)
            }
            (Phase::Lobby, ClientEvent::AddPlayer { new_player }) => {
                self.on_add_player(conn.id(), new_player)
            }
            (Phase::Lobby, ClientEvent::StartGame) => self.on_start_game(),
            (Phase::Lobby, ClientEvent::PlayerLeft { .. }) => {
                // Roster entries survive lobby departures; a rule engine
                // may hook in here.
                Vec::new()
            }
            (phase, ClientEvent::PlayerLeft { player_id })
                if phase.is_in_game() =>
            {
                self.on_player_left(&player_id)
            }
            (Phase::WaitingForReconnect, ClientEvent::ResumeGame) => {
                self.on_resume_game()
            }
            (_, ClientEvent::SpectatorLeft) => {
                self.detach(conn.id());
                Vec::new()
            }
            (_, ClientEvent::PlayedCard) => {
                // Rule-engine event: preserved for the game layer, no
                // session transition.
                Vec::new()
            }
            (phase, event) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %phase,
                    ?event,
                    "event ignored in this phase"
                );
                Vec::new()
            }
        }
    }

    fn on_new_connection(
        &mut self,
        conn: ConnectionHandle,
        presented: Option<PlayerId>,
    ) -> Vec<Effect> {
        let conn_id = conn.id();
        self.connections.insert(conn_id, conn);

        if self.phase.is_lobby() {
            // Confirm the presented identity or mint a fresh one; the
            // client persists whatever comes back and re-presents it on
            // every future connection.
            let player_id =
                presented.unwrap_or_else(generate_player_id);
            tracing::info!(
                room_id = %self.room_id,
                conn = %conn_id,
                %player_id,
                "connection joined lobby"
            );
            return vec![Effect::SendTo(
                conn_id,
                ServerEvent::ConnectedLobby {
                    players: self.roster(),
                    player_id,
                },
            )];
        }

        // Mid-game: a presented identity reclaims its seat only while that
        // exact id is marked disconnected. Everyone else is a spectator —
        // including a stale token for a seat that is actively connected.
        if let Some(player_id) = presented {
            if self.disconnected.remove(&player_id) {
                if let Some(player) = self.players.get_mut(&player_id) {
                    player.connection = Some(conn_id);
                    player.connected = true;
                }
                tracing::info!(
                    room_id = %self.room_id,
                    conn = %conn_id,
                    %player_id,
                    "player reconnected"
                );
                return vec![Effect::SendTo(
                    conn_id,
                    ServerEvent::ConnectedPlayerSync,
                )];
            }
        }

        tracing::info!(
            room_id = %self.room_id,
            conn = %conn_id,
            "spectator joined running game"
        );
        vec![Effect::SendTo(conn_id, ServerEvent::ConnectedSpecSync)]
    }

    fn on_add_player(
        &mut self,
        conn_id: ConnectionId,
        (player_id, name): (PlayerId, String),
    ) -> Vec<Effect> {
        // Re-seating an existing id replaces the record but keeps its
        // join-order slot.
        if !self.players.contains_key(&player_id) {
            self.join_order.push(player_id.clone());
        }
        self.players
            .insert(player_id.clone(), Player::new(name.clone(), conn_id));

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            %name,
            players = self.players.len(),
            "player seated"
        );

        vec![Effect::Broadcast(ServerEvent::PlayerAdded {
            new_player: (player_id, name),
        })]
    }

    fn on_start_game(&mut self) -> Vec<Effect> {
        self.phase = Phase::Playing;
        tracing::info!(
            room_id = %self.room_id,
            players = self.players.len(),
            "game started"
        );
        vec![Effect::Broadcast(ServerEvent::GameStarted {
            // The initial state is the rule engine's to define; this
            // substrate has nothing to put in it.
            initial_state: serde_json::Value::Null,
        })]
    }

    fn on_player_left(&mut self, player_id: &PlayerId) -> Vec<Effect> {
        let Some(player) = self.players.get_mut(player_id) else {
            tracing::debug!(
                room_id = %self.room_id,
                %player_id,
                "PLAYER_LEFT for unknown player, ignoring"
            );
            return Vec::new();
        };

        player.connected = false;
        if let Some(conn_id) = player.connection.take() {
            self.connections.remove(&conn_id);
        }
        self.disconnected.insert(player_id.clone());

        if self.phase == Phase::Playing {
            self.phase = Phase::WaitingForReconnect;
        }
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            "player dropped mid-game, waiting for reconnect"
        );
        Vec::new()
    }

    fn on_resume_game(&mut self) -> Vec<Effect> {
        // The table decided to proceed without the missing players: their
        // ids leave the disconnected set, so a late return re-enters as a
        // spectator.
        let abandoned = self.disconnected.len();
        self.disconnected.clear();
        self.phase = Phase::Playing;
        tracing::info!(
            room_id = %self.room_id,
            abandoned,
            "game resumed without missing players"
        );
        Vec::new()
    }

    /// Transport close: detach the connection, and if it was carrying a
    /// seated player, treat it as that player leaving.
    fn apply_closed(&mut self, conn_id: ConnectionId) -> Vec<Effect> {
        self.detach(conn_id);

        let owner = self.players.iter().find_map(|(id, p)| {
            (p.connection == Some(conn_id) && p.connected)
                .then(|| id.clone())
        });

        match owner {
            Some(player_id) if self.phase.is_in_game() => {
                self.on_player_left(&player_id)
            }
            Some(player_id) => {
                // Lobby drop: the seat stays on the roster but is no
                // longer backed by a live connection.
                if let Some(player) = self.players.get_mut(&player_id) {
                    player.connected = false;
                    player.connection = None;
                }
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn detach(&mut self, conn_id: ConnectionId) {
        if self.connections.remove(&conn_id).is_some() {
            tracing::debug!(
                room_id = %self.room_id,
                conn = %conn_id,
                "connection detached"
            );
        }
    }
}

/// Generates a fresh identity token: 32 hex chars, 128 bits of entropy.
///
/// Handed to a connection that presented no token of its own; the client
/// persists it and presents it on every later `NEW_CONNECTION`.
fn generate_player_id() -> PlayerId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    PlayerId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

// =========================================================================
// Tests
// =========================================================================
