//! Wire protocol for Cardroom.
//!
//! This crate defines the JSON messages that clients and the server
//! exchange over a room's persistent connection:
//!
//! - **Types** ([`ClientFrame`], [`ClientEvent`], [`ServerEvent`]) — the
//!   structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw frames) and the session
//! layer (rooms, players). It doesn't know about connections or rooms —
//! it only knows how to serialize and deserialize messages.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientEvent, ClientFrame, PlayerId, RoomId, ServerEvent};
