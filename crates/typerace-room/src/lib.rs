//! Room management for Typerace.
//!
//! All room state lives in one [`RoomRegistry`], owned by one
//! [`RoomCoordinator`]. The coordinator runs as a single Tokio task
//! (actor model) so events are applied strictly one at a time.
//!
//! # Key types
//!
//! - [`Room`] / [`Player`]: per-room state and the rules for changing it
//! - [`RoomRegistry`]: live rooms by code; empty rooms are deleted
//! - [`RoomCoordinator`]: applies client events and broadcasts results
//! - [`CoordinatorHandle`]: send commands to the running coordinator
//! - [`generate_room_code`]: fresh shareable room codes

mod actor;
mod code;
mod coordinator;
mod error;
mod registry;
mod room;

pub use actor::{spawn_coordinator, CoordinatorHandle, RoomInfo};
pub use code::{generate_room_code, generate_room_code_with};
pub use coordinator::{PlayerSender, RoomCoordinator, CHAT_MESSAGE_MAX_CHARS};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{FinishTrigger, Player, Room};
