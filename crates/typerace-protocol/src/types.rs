//! Core value types shared by inbound and outbound events.
//!
//! Everything in here travels on the wire, so the serde attributes are
//! part of the contract with the browser client: camelCase field names,
//! lowercase enum values, and plain numbers/strings for identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use typerace_transport::ConnectionId;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity: the id of the connection they play from.
///
/// There are no accounts. A reconnect gets a fresh id, so two
/// `PlayerId`s never refer to the same connection.
///
/// Serialized as a plain number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// The username used when a joiner doesn't supply one: `Player`
    /// followed by the first four characters of the id.
    pub fn default_username(&self) -> String {
        let id = self.0.to_string();
        let prefix: String = id.chars().take(4).collect();
        format!("Player{prefix}")
    }
}

impl From<ConnectionId> for PlayerId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Characters a generated room code is drawn from. `0`, `1`, `I` and
/// `O` are left out so codes can be read aloud without ambiguity.
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a generated room code.
pub const ROOM_CODE_LEN: usize = 6;

/// The identifier of a room, as typed or shared by players.
///
/// Codes are normalized on parse (trimmed, upper-cased) so `abcxyz` and
/// ` ABCXYZ ` address the same room. Any non-empty code is accepted:
/// the server does not insist on the generated shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parses and normalizes a client-supplied room id.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MissingField`] for an empty or
    /// whitespace-only id.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::MissingField("Room ID"));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Builds a code of [`ROOM_CODE_LEN`] characters from
    /// [`ROOM_CODE_ALPHABET`]. `pick(n)` must return an index below `n`;
    /// larger values wrap.
    pub fn random_with(mut pick: impl FnMut(usize) -> usize) -> Self {
        let alphabet: Vec<char> = ROOM_CODE_ALPHABET.chars().collect();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| alphabet[pick(alphabet.len()) % alphabet.len()])
            .collect();
        Self(code)
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this code could have come from the room-code
    /// generator: [`ROOM_CODE_LEN`] characters from [`ROOM_CODE_ALPHABET`].
    pub fn is_generated_shape(&self) -> bool {
        self.0.chars().count() == ROOM_CODE_LEN
            && self.0.chars().all(|c| ROOM_CODE_ALPHABET.contains(c))
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room's game.
///
/// ```text
/// Waiting → Playing → Finished
///              ↑          │
///              └─restart──┘
/// ```
///
/// A restart always passes through `Playing`; there is no way back to
/// `Waiting` once a game has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    #[default]
    Waiting,
    Playing,
    Finished,
}

impl GameState {
    /// Returns `true` if moving from `self` to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Playing)
                | (Self::Playing, Self::Finished)
                | (Self::Finished, Self::Playing)
        )
    }

    /// Returns `true` while a game is running.
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How a game is scored and when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Type as much as possible before the clock runs out.
    #[default]
    Time,
    /// Race to the end of a fixed-length passage.
    Words,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Words => write!(f, "words"),
        }
    }
}

/// Default round length in seconds for [`GameMode::Time`].
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;

/// Default passage length for [`GameMode::Words`].
pub const DEFAULT_WORD_COUNT: u32 = 30;

/// A room's session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Round length in seconds.
    pub time_limit: u32,
    /// Number of words the creator's client generates per passage.
    pub word_count: u32,
    /// Scoring/ending mode.
    pub game_mode: GameMode,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            word_count: DEFAULT_WORD_COUNT,
            game_mode: GameMode::default(),
        }
    }
}

/// A partial settings update. Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<GameMode>,
}

impl SettingsPatch {
    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.time_limit.is_none() && self.word_count.is_none() && self.game_mode.is_none()
    }
}

// ---------------------------------------------------------------------------
// Player data
// ---------------------------------------------------------------------------

/// Typing statistics as reported by a client. Trusted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    /// Percent of the passage completed, nominally 0–100.
    pub progress: f64,
    /// Words per minute.
    pub wpm: f64,
    /// Accuracy percentage.
    pub accuracy: f64,
    /// Whether the client considers itself done.
    pub finished: bool,
}

/// One roster entry, as broadcast to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub username: String,
    pub progress: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub finished: bool,
    pub ready: bool,
}
