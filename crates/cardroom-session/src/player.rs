//! The server-side record of one player at a table.

use cardroom_transport::ConnectionId;

/// A player known to a session.
///
/// Created on the first `ADD_PLAYER` for a never-before-seen identity and
/// never removed — a departed player is only marked disconnected so they
/// can reclaim the seat later.
///
/// `hand`, `played_cards`, and `played_this_turn` belong to the card-game
/// rule engine. The session substrate keeps them alive across reconnects
/// but never reads or interprets them.
#[derive(Debug, Clone)]
pub struct Player {
    /// Display name, chosen by the client in the lobby.
    pub name: String,

    /// The connection currently representing this player.
    /// `None` while disconnected; rebound on reconnect.
    pub connection: Option<ConnectionId>,

    /// True iff `connection` is currently live.
    pub connected: bool,

    /// Rule-engine state (opaque here).
    pub hand: Vec<String>,
    /// Rule-engine state (opaque here).
    pub played_cards: Vec<String>,
    /// Rule-engine state (opaque here).
    pub played_this_turn: bool,
}

impl Player {
    /// A freshly seated player bound to the connection that seated them.
    pub fn new(name: impl Into<String>, connection: ConnectionId) -> Self {
        Self {
            name: name.into(),
            connection: Some(connection),
            connected: true,
            hand: Vec::new(),
            played_cards: Vec::new(),
            played_this_turn: false,
        }
    }
}
