//! Per-room session management for Cardroom.
//!
//! This crate is the stateful heart of the server:
//!
//! 1. **Session** — one state machine per room ([`Session`], [`Phase`]),
//!    owning the player roster, the attached connections, and the
//!    mid-game disconnect bookkeeping that makes reconnection work.
//! 2. **Registry** — maps room ids to sessions ([`Registry`]), creates
//!    rooms on demand, answers existence checks.
//! 3. **Dispatcher** — a single task that owns the registry and drains
//!    one queue of commands ([`spawn_registry`], [`RegistryHandle`]), so
//!    every inbound event in the process is applied one at a time in
//!    arrival order.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)    ← feeds decoded frames and synthesized closes in
//!     ↕
//! Session layer (this crate)  ← the only place room state mutates
//!     ↕
//! Protocol layer (below)      ← wire event types
//! ```

mod connection;
mod dispatch;
mod error;
mod player;
mod registry;
mod session;

pub use connection::{broadcast, ConnectionHandle, Envelope, SessionEvent};
pub use dispatch::{spawn_registry, RegistryHandle};
pub use error::RegistryError;
pub use player::Player;
pub use registry::{Registry, RoomSummary};
pub use session::{Effect, Phase, Session};
