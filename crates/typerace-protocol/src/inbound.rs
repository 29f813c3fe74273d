//! Client → server events.
//!
//! Decoding happens in two steps. The frame is first parsed into a
//! permissive [`InboundFrame`] where every payload field is optional,
//! then converted into a [`ClientEvent`] that carries only validated,
//! normalized values. Handlers downstream never see a missing room id.
//!
//! Wire shape: `{"event": "<name>", "data": <payload>}`.

use serde::Deserialize;

use crate::{Codec, GameMode, ProgressReport, ProtocolError, RoomCode, SettingsPatch};

/// A validated event from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Join (creating if needed) a room.
    JoinRoom {
        room: RoomCode,
        /// Trimmed, non-blank display name, if one was supplied.
        username: Option<String>,
    },
    /// Start (or restart) the game with the given passage.
    StartGame { room: RoomCode, words: String },
    /// The sender's latest typing statistics.
    UpdateProgress {
        room: RoomCode,
        report: ProgressReport,
    },
    /// The sender's round clock ran out.
    TimeUp { room: RoomCode },
    /// The sender toggled their ready flag.
    PlayerReady { room: RoomCode, ready: bool },
    /// Change one or more room settings.
    UpdateSettings {
        room: RoomCode,
        patch: SettingsPatch,
    },
    /// A chat line. `message` is untrimmed and may be empty.
    ChatMessage {
        room: RoomCode,
        message: String,
        username: Option<String>,
    },
    /// Leave a room.
    LeaveRoom { room: RoomCode },
}

impl ClientEvent {
    /// Returns the room the event addresses.
    pub fn room(&self) -> &RoomCode {
        match self {
            Self::JoinRoom { room, .. }
            | Self::StartGame { room, .. }
            | Self::UpdateProgress { room, .. }
            | Self::TimeUp { room }
            | Self::PlayerReady { room, .. }
            | Self::UpdateSettings { room, .. }
            | Self::ChatMessage { room, .. }
            | Self::LeaveRoom { room } => room,
        }
    }

    /// Returns the wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::StartGame { .. } => "start-game",
            Self::UpdateProgress { .. } => "update-progress",
            Self::TimeUp { .. } => "time-up",
            Self::PlayerReady { .. } => "player-ready",
            Self::UpdateSettings { .. } => "update-settings",
            Self::ChatMessage { .. } => "chat-message",
            Self::LeaveRoom { .. } => "leave-room",
        }
    }
}

/// Decodes and validates one client frame.
///
/// # Errors
/// - [`ProtocolError::Decode`] for malformed JSON, unknown event names,
///   or payloads of the wrong shape.
/// - [`ProtocolError::MissingField`] when a required field is absent or
///   blank.
pub fn decode_client_event<C: Codec>(codec: &C, data: &[u8]) -> Result<ClientEvent, ProtocolError> {
    let frame: InboundFrame = codec.decode(data)?;
    ClientEvent::try_from(frame)
}

// ---------------------------------------------------------------------------
// Raw wire shapes
// ---------------------------------------------------------------------------

/// The permissive wire form of a client event.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub(crate) enum InboundFrame {
    JoinRoom(JoinRoomPayload),
    StartGame(StartGamePayload),
    UpdateProgress(UpdateProgressPayload),
    TimeUp(RoomRef),
    PlayerReady(PlayerReadyPayload),
    UpdateSettings(UpdateSettingsPayload),
    ChatMessage(ChatMessagePayload),
    LeaveRoom(LeaveRoomPayload),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RoomRef {
    room_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct JoinRoomPayload {
    room_id: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct StartGamePayload {
    room_id: Option<String>,
    words: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct UpdateProgressPayload {
    room_id: Option<String>,
    progress: Option<f64>,
    wpm: Option<f64>,
    accuracy: Option<f64>,
    finished: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PlayerReadyPayload {
    room_id: Option<String>,
    ready: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct UpdateSettingsPayload {
    room_id: Option<String>,
    time_limit: Option<u32>,
    word_count: Option<u32>,
    game_mode: Option<GameMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ChatMessagePayload {
    room_id: Option<String>,
    message: Option<String>,
    username: Option<String>,
}

/// `leave-room` carries a bare room id; an object form is tolerated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LeaveRoomPayload {
    Bare(String),
    Object(RoomRef),
}

fn require_room(room_id: Option<String>) -> Result<RoomCode, ProtocolError> {
    match room_id {
        Some(raw) => RoomCode::parse(&raw),
        None => Err(ProtocolError::MissingField("Room ID")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<InboundFrame> for ClientEvent {
    type Error = ProtocolError;

    fn try_from(frame: InboundFrame) -> Result<Self, Self::Error> {
        let event = match frame {
            InboundFrame::JoinRoom(p) => Self::JoinRoom {
                room: require_room(p.room_id)?,
                username: non_blank(p.username),
            },
            InboundFrame::StartGame(p) => {
                let room = require_room(p.room_id)?;
                let words = p
                    .words
                    .filter(|w| !w.trim().is_empty())
                    .ok_or(ProtocolError::MissingField("Words"))?;
                Self::StartGame { room, words }
            }
            InboundFrame::UpdateProgress(p) => Self::UpdateProgress {
                room: require_room(p.room_id)?,
                report: ProgressReport {
                    progress: p.progress.unwrap_or_default(),
                    wpm: p.wpm.unwrap_or_default(),
                    accuracy: p.accuracy.unwrap_or_default(),
                    finished: p.finished.unwrap_or_default(),
                },
            },
            InboundFrame::TimeUp(p) => Self::TimeUp {
                room: require_room(p.room_id)?,
            },
            InboundFrame::PlayerReady(p) => Self::PlayerReady {
                room: require_room(p.room_id)?,
                ready: p.ready.unwrap_or_default(),
            },
            InboundFrame::UpdateSettings(p) => Self::UpdateSettings {
                room: require_room(p.room_id)?,
                patch: SettingsPatch {
                    time_limit: p.time_limit,
                    word_count: p.word_count,
                    game_mode: p.game_mode,
                },
            },
            InboundFrame::ChatMessage(p) => Self::ChatMessage {
                room: require_room(p.room_id)?,
                message: p.message.unwrap_or_default(),
                username: non_blank(p.username),
            },
            InboundFrame::LeaveRoom(LeaveRoomPayload::Bare(raw)) => Self::LeaveRoom {
                room: RoomCode::parse(&raw)?,
            },
            InboundFrame::LeaveRoom(LeaveRoomPayload::Object(p)) => Self::LeaveRoom {
                room: require_room(p.room_id)?,
            },
        };
        Ok(event)
    }
}
