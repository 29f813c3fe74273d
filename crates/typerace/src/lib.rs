//! # Typerace
//!
//! Multiplayer typing-race server.
//!
//! Players connect over WebSocket, join rooms by a shareable code, and
//! race through the same passage while the server relays everyone's
//! progress. All room state is in memory; a restart forgets every room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typerace::prelude::*;
//!
//! # async fn demo() -> Result<(), TyperaceError> {
//! let config = ServerConfig::from_env()?;
//! let server = TyperaceServer::builder().config(config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{
    ConfigError, ServerConfig, DEFAULT_BIND_ADDRESS, DEFAULT_COMMAND_BUFFER,
    DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_KEEPALIVE_SECS,
};
pub use error::TyperaceError;
pub use server::{TyperaceServer, TyperaceServerBuilder};

/// The types most applications need.
pub mod prelude {
    pub use crate::{ServerConfig, TyperaceError, TyperaceServer, TyperaceServerBuilder};
    pub use typerace_protocol::{ClientEvent, PlayerId, RoomCode, ServerEvent};
    pub use typerace_room::{generate_room_code, CoordinatorHandle};
}
