//! Codec trait and implementations for serializing/deserializing events.
//!
//! The protocol layer doesn't care HOW events are serialized; it needs
//! something that implements [`Codec`]. [`JsonCodec`] is the only
//! implementation today because browser clients speak JSON text frames.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// An encoded frame, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 text frame.
    Text(String),
    /// An opaque binary frame.
    Binary(Vec<u8>),
}

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec is shared by every
/// connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Serializes a value into a transport frame.
    ///
    /// Defaults to a binary frame. Text-based codecs override this so
    /// clients receive text frames they can `JSON.parse` directly.
    fn encode_frame<T: Serialize>(&self, value: &T) -> Result<Frame, ProtocolError> {
        self.encode(value).map(Frame::Binary)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use typerace_protocol::{Codec, Frame, JsonCodec, PlayerId, ServerEvent};
///
/// let codec = JsonCodec;
/// let event = ServerEvent::Connected { id: PlayerId(7) };
///
/// let frame = codec.encode_frame(&event).unwrap();
/// assert_eq!(frame, Frame::Text(r#"{"event":"connected","data":{"id":7}}"#.into()));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_frame<T: Serialize>(&self, value: &T) -> Result<Frame, ProtocolError> {
        serde_json::to_string(value)
            .map(Frame::Text)
            .map_err(ProtocolError::Encode)
    }
}
