//! Wire protocol for Typerace.
//!
//! This crate defines the events clients and the server exchange:
//!
//! - **Types** ([`PlayerId`], [`RoomCode`], [`GameState`],
//!   [`RoomSettings`], [`PlayerSnapshot`], ...) — values shared by
//!   both directions.
//! - **Inbound** ([`ClientEvent`], [`decode_client_event`]) — the closed
//!   set of client events, validated at the boundary.
//! - **Outbound** ([`ServerEvent`], [`RoomSnapshot`]) — what the server
//!   broadcasts.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events become
//!   frames.
//!
//! ```text
//! Transport (frames) → Protocol (ClientEvent) → Room coordinator
//! ```

mod codec;
mod error;
mod inbound;
mod outbound;
mod types;

pub use codec::{Codec, Frame};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use inbound::{decode_client_event, ClientEvent};
pub use outbound::{RoomSnapshot, ServerEvent};
pub use types::{
    GameMode, GameState, PlayerId, PlayerSnapshot, ProgressReport, RoomCode, RoomSettings,
    SettingsPatch, DEFAULT_TIME_LIMIT_SECS, DEFAULT_WORD_COUNT, ROOM_CODE_ALPHABET,
    ROOM_CODE_LEN,
};
