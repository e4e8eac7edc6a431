//! Core protocol types for Cardroom's wire format.
//!
//! Every logical event is one UTF-8 JSON object with a mandatory `type`
//! discriminant. Client→server messages additionally carry a top-level
//! `roomid` so the server can route them; server→client messages omit it
//! (they are scoped by the connection they are sent on).

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity token.
///
/// Opaque to the server beyond equality and hashing. The client persists
/// this string locally and re-presents it on every `NEW_CONNECTION`, which
/// is what lets a player reclaim their seat after a dropped connection.
/// `#[serde(transparent)]` keeps the JSON representation a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room's externally addressable identifier.
///
/// Chosen by whoever creates the room (the HTTP surface passes it through
/// verbatim). Unique across the registry, immutable for the room's life.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Events a client sends into a room.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "ADD_PLAYER", "newPlayer": ["p1", "Alice"] }`, matching what
/// the browser client emits.
///
/// `PLAYED_CARD` belongs to the card-game rule engine, not to this
/// substrate: the router still parses and routes it, but no session
/// transition consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// A connection attaches to the room, optionally presenting a
    /// previously issued identity token.
    #[serde(rename = "NEW_CONNECTION")]
    NewConnection {
        #[serde(
            rename = "playerId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        player_id: Option<PlayerId>,
    },

    /// Claim a seat at the table: `newPlayer` is `[id, name]`.
    #[serde(rename = "ADD_PLAYER")]
    AddPlayer {
        #[serde(rename = "newPlayer")]
        new_player: (PlayerId, String),
    },

    /// Somebody clicked "start game" in the lobby.
    #[serde(rename = "START_GAME")]
    StartGame,

    /// Somebody clicked "keep playing" while waiting for a reconnect.
    #[serde(rename = "RESUME_GAME")]
    ResumeGame,

    /// A player's connection is gone. Clients may send this explicitly;
    /// the router also synthesizes the equivalent on transport close.
    #[serde(rename = "PLAYER_LEFT")]
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },

    /// A non-player connection is gone.
    #[serde(rename = "SPECTATOR_LEFT")]
    SpectatorLeft,

    /// Rule-engine event, opaque to the session substrate.
    #[serde(rename = "PLAYED_CARD")]
    PlayedCard,
}

/// The top-level shape of every client→server message: the event fields
/// plus a mandatory `roomid` used only for routing.
///
/// A frame that fails to parse — malformed JSON, unknown `type`, missing
/// `roomid` — never reaches a session; the router drops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub roomid: RoomId,
    #[serde(flatten)]
    pub event: ClientEvent,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Events the server sends to connections.
///
/// The two `*_SYNC` events and `GAME_STARTED.initialState` are the rule
/// engine's interface: this layer sends them with empty/null payloads and
/// a concrete game fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to a `NEW_CONNECTION` while the room is in its lobby:
    /// the current roster in join order, and the connecting client's
    /// identity token (echoed back, or freshly assigned).
    #[serde(rename = "CONNECTED_LOBBY")]
    ConnectedLobby {
        players: Vec<(PlayerId, String)>,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },

    /// Full-state resync for a player reclaiming their seat mid-game.
    #[serde(rename = "CONNECTED_PLAYER_SYNC")]
    ConnectedPlayerSync,

    /// Full-state resync for a spectator joining mid-game.
    #[serde(rename = "CONNECTED_SPEC_SYNC")]
    ConnectedSpecSync,

    /// Broadcast when a player takes a seat: `newPlayer` is `[id, name]`.
    #[serde(rename = "PLAYER_ADDED")]
    PlayerAdded {
        #[serde(rename = "newPlayer")]
        new_player: (PlayerId, String),
    },

    /// Broadcast when the lobby starts the game.
    #[serde(rename = "GAME_STARTED")]
    GameStarted {
        #[serde(rename = "initialState")]
        initial_state: serde_json::Value,
    },

    /// An error notification, e.g. a transport failure on a sibling
    /// connection.
    #[serde(rename = "ERROR")]
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
