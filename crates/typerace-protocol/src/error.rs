//! Error types for the protocol layer.
//!
//! Everything here is a category (a) failure: the frame was malformed or
//! failed validation, and the originating connection is told so.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown event name,
    /// or a payload with the wrong shape.
    #[cfg(feature = "json")]
    #[error("invalid event: {0}")]
    Decode(serde_json::Error),

    /// A required payload field was absent or blank.
    ///
    /// Displays as e.g. "Room ID is required", which is also the text
    /// sent back to the client.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The frame decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_reads_as_client_message() {
        let err = ProtocolError::MissingField("Room ID");
        assert_eq!(err.to_string(), "Room ID is required");
    }

    #[test]
    fn test_invalid_message_display() {
        let err = ProtocolError::InvalidMessage("wordCount must be positive".into());
        assert_eq!(err.to_string(), "invalid message: wordCount must be positive");
    }
}
