//! Error types for the room layer.

use typerace_protocol::{PlayerId, RoomCode};

/// Errors that can occur while handling a room event.
///
/// Variants fall into two groups. Reference errors ([`NotFound`],
/// [`NotInRoom`]) and late progress ([`NotPlaying`]) usually mean the
/// client's view is stale, e.g. the room was cleaned up after everyone
/// left or the race ended while a report was in flight; they are logged
/// and dropped. Everything else is reported back to the caller as an
/// `error` event. See [`RoomError::is_reported`].
///
/// [`NotFound`]: RoomError::NotFound
/// [`NotInRoom`]: RoomError::NotInRoom
/// [`NotPlaying`]: RoomError::NotPlaying
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The player is not a member of this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// Progress arrived while no race is running.
    #[error("room {0} has no race in progress")]
    NotPlaying(RoomCode),

    /// A creator-only action was attempted by someone else.
    #[error("Only the room creator can {action}")]
    NotCreator { action: &'static str },

    /// The room's game state doesn't allow this operation.
    #[error("{0}")]
    InvalidState(String),

    /// A settings update carried unusable values.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The coordinator task has stopped.
    #[error("room coordinator is unavailable")]
    Unavailable,
}

impl RoomError {
    /// Returns `true` if the caller should be sent an `error` event.
    pub fn is_reported(&self) -> bool {
        !matches!(
            self,
            Self::NotFound(_) | Self::NotInRoom(..) | Self::NotPlaying(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> RoomCode {
        RoomCode::parse("ABCXYZ").unwrap()
    }

    #[test]
    fn test_reference_errors_are_silent() {
        assert!(!RoomError::NotFound(code()).is_reported());
        assert!(!RoomError::NotInRoom(PlayerId(1), code()).is_reported());
        assert!(!RoomError::NotPlaying(code()).is_reported());
    }

    #[test]
    fn test_authorization_and_state_errors_are_reported() {
        let err = RoomError::NotCreator {
            action: "start the game",
        };
        assert!(err.is_reported());
        assert_eq!(err.to_string(), "Only the room creator can start the game");

        assert!(RoomError::InvalidState("Game already in progress".into()).is_reported());
        assert!(RoomError::InvalidSettings("wordCount must be positive".into()).is_reported());
    }
}
