//! Server → client events.
//!
//! `#[serde(tag = "event", content = "data")]` mirrors the inbound
//! framing, so every frame a client sees is `{"event": ..., "data": ...}`.
//! Variant names become kebab-case event names and struct fields become
//! camelCase keys.

use serde::{Deserialize, Serialize};

use crate::{GameState, PlayerId, PlayerSnapshot, RoomCode, RoomSettings};

/// Full view of a room, sent to a player when they join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomCode,
    pub players: Vec<PlayerSnapshot>,
    pub game_state: GameState,
    /// The current passage; `null` until the first game starts.
    pub words: Option<String>,
    /// Unix epoch milliseconds of the last start; `null` unless playing.
    pub start_time: Option<u64>,
    pub creator: PlayerId,
    #[serde(flatten)]
    pub settings: RoomSettings,
}

/// An event sent from the server to one or more clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Greeting sent once per connection, carrying the client's own id.
    Connected { id: PlayerId },

    /// Sent to a joiner: the whole room as it stands.
    RoomState(RoomSnapshot),

    /// Sent to everyone else in the room when a player joins.
    PlayerJoined {
        player: PlayerSnapshot,
        players: Vec<PlayerSnapshot>,
        #[serde(flatten)]
        settings: RoomSettings,
    },

    /// Sent to the remaining players when someone leaves or disconnects.
    PlayerLeft {
        player_id: PlayerId,
        username: String,
        players: Vec<PlayerSnapshot>,
    },

    /// A game (re)started. Every player's stats have been reset.
    GameStarted {
        words: String,
        start_time: u64,
        players: Vec<PlayerSnapshot>,
        #[serde(flatten)]
        settings: RoomSettings,
    },

    /// One player's stats changed.
    ProgressUpdate {
        player_id: PlayerId,
        progress: f64,
        wpm: f64,
        accuracy: f64,
        finished: bool,
        players: Vec<PlayerSnapshot>,
    },

    /// The game ended; `players` holds the final standings.
    GameFinished { players: Vec<PlayerSnapshot> },

    /// One player's ready flag changed.
    PlayerReadyUpdate {
        player_id: PlayerId,
        ready: bool,
        players: Vec<PlayerSnapshot>,
    },

    /// The creator changed the room settings. Carries the merged result.
    SettingsUpdated(RoomSettings),

    /// A chat line. `timestamp` is Unix epoch milliseconds.
    NewChatMessage {
        username: String,
        message: String,
        timestamp: u64,
    },

    /// The caller's last event was rejected.
    Error { message: String },
}

impl ServerEvent {
    /// Returns the wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::RoomState(_) => "room-state",
            Self::PlayerJoined { .. } => "player-joined",
            Self::PlayerLeft { .. } => "player-left",
            Self::GameStarted { .. } => "game-started",
            Self::ProgressUpdate { .. } => "progress-update",
            Self::GameFinished { .. } => "game-finished",
            Self::PlayerReadyUpdate { .. } => "player-ready-update",
            Self::SettingsUpdated(_) => "settings-updated",
            Self::NewChatMessage { .. } => "new-chat-message",
            Self::Error { .. } => "error",
        }
    }
}
