//! # Cardroom
//!
//! A session/connection substrate for multiplayer card games.
//!
//! Clients join a named room over a WebSocket, gather in a lobby, start a
//! game, and survive transient disconnects by reconnecting into the
//! running session with a persisted identity token. A thin HTTP surface
//! answers room existence checks, creation, and discovery.
//!
//! This crate ties the layers together: transport → protocol → session.
//! The card-game rules themselves are not here — the session layer
//! carries their state and events opaquely.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardroom::prelude::*;
//!
//! # async fn run() -> Result<(), CardroomError> {
//! let server = CardroomServerBuilder::new()
//!     .ws_bind("0.0.0.0:8080")
//!     .http_bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod http;
mod router;
mod server;

pub use error::CardroomError;
pub use http::control_router;
pub use server::{CardroomServer, CardroomServerBuilder};

pub mod prelude {
    pub use crate::{CardroomError, CardroomServer, CardroomServerBuilder};
    pub use cardroom_protocol::{
        ClientEvent, ClientFrame, Codec, JsonCodec, PlayerId, RoomId,
        ServerEvent,
    };
    pub use cardroom_session::{Phase, RegistryHandle, RoomSummary};
}
