//! Room-code generation.
//!
//! Codes are uniformly random over [`ROOM_CODE_ALPHABET`] and are not
//! checked against live rooms. A collision merges two lobbies into one
//! room, which is harmless.
//!
//! [`ROOM_CODE_ALPHABET`]: typerace_protocol::ROOM_CODE_ALPHABET

use rand::Rng;
use typerace_protocol::RoomCode;

/// Generates a fresh room code from the thread-local RNG.
pub fn generate_room_code() -> RoomCode {
    generate_room_code_with(&mut rand::rng())
}

/// Generates a room code from a caller-supplied RNG.
pub fn generate_room_code_with<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    RoomCode::random_with(|n| rng.random_range(0..n))
}
