//! Room and player state.
//!
//! A [`Room`] is plain data plus the rules for mutating it. It never
//! sends anything; the coordinator decides who hears about a change.

use typerace_protocol::{
    GameMode, GameState, PlayerId, PlayerSnapshot, ProgressReport, RoomCode, RoomSettings,
    RoomSnapshot, SettingsPatch,
};

use crate::RoomError;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant in a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub progress: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub finished: bool,
    pub ready: bool,
}

impl Player {
    /// Creates a player with zeroed stats.
    pub fn new(id: PlayerId, username: String) -> Self {
        Self {
            id,
            username,
            progress: 0.0,
            wpm: 0.0,
            accuracy: 0.0,
            finished: false,
            ready: false,
        }
    }

    /// Zeroes the per-game stats. `ready` is left alone.
    pub fn reset_stats(&mut self) {
        self.progress = 0.0;
        self.wpm = 0.0;
        self.accuracy = 0.0;
        self.finished = false;
    }

    /// Overwrites the stats with a client report.
    pub fn apply(&mut self, report: ProgressReport) {
        self.progress = report.progress;
        self.wpm = report.wpm;
        self.accuracy = report.accuracy;
        self.finished = report.finished;
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            username: self.username.clone(),
            progress: self.progress,
            wpm: self.wpm,
            accuracy: self.accuracy,
            finished: self.finished,
            ready: self.ready,
        }
    }
}

// ---------------------------------------------------------------------------
// FinishTrigger
// ---------------------------------------------------------------------------

/// The single event that ends a game, chosen by the room's mode.
///
/// Only one trigger is live per game. In `time` mode clients keep
/// getting fresh passages until the clock runs out, so per-player
/// completion means nothing; in `words` mode there is no clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishTrigger {
    /// A client reports `time-up`.
    TimeUp,
    /// Every current member has reported `finished: true`.
    AllPlayersFinished,
}

impl From<GameMode> for FinishTrigger {
    fn from(mode: GameMode) -> Self {
        match mode {
            GameMode::Time => Self::TimeUp,
            GameMode::Words => Self::AllPlayersFinished,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A named game session with its own roster, passage, and state.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    /// Join order is preserved; the roster is broadcast in this order.
    players: Vec<Player>,
    game_state: GameState,
    words: Option<String>,
    start_time: Option<u64>,
    creator: PlayerId,
    settings: RoomSettings,
}

impl Room {
    /// Creates an empty, waiting room owned by `creator`.
    pub fn new(code: RoomCode, creator: PlayerId) -> Self {
        Self {
            code,
            players: Vec::new(),
            game_state: GameState::Waiting,
            words: None,
            start_time: None,
            creator,
            settings: RoomSettings::default(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The connection that caused the room to exist. Never reassigned,
    /// even after that player leaves.
    pub fn creator(&self) -> PlayerId {
        self.creator
    }

    pub fn is_creator(&self, player_id: PlayerId) -> bool {
        self.creator == player_id
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    pub fn words(&self) -> Option<&str> {
        self.words.as_deref()
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn settings(&self) -> RoomSettings {
        self.settings
    }

    pub fn finish_trigger(&self) -> FinishTrigger {
        self.settings.game_mode.into()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.player(player_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Adds a player, or replaces the entry if this connection is
    /// already a member. A replaced entry keeps its roster position.
    pub fn upsert_player(&mut self, player_id: PlayerId, username: String) -> &Player {
        let fresh = Player::new(player_id, username);
        match self.players.iter().position(|p| p.id == player_id) {
            Some(idx) => {
                self.players[idx] = fresh;
                &self.players[idx]
            }
            None => {
                self.players.push(fresh);
                &self.players[self.players.len() - 1]
            }
        }
    }

    /// Removes a player, returning their final entry.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        Some(self.players.remove(idx))
    }

    /// Moves the room to `playing` with a fresh passage.
    ///
    /// Valid from `waiting` (first game) or `finished` (restart).
    /// Every player's stats are zeroed.
    pub fn start(&mut self, words: String, now_ms: u64) -> Result<(), RoomError> {
        if !self.game_state.can_transition_to(GameState::Playing) {
            return Err(RoomError::InvalidState("Game already in progress".into()));
        }
        self.game_state = GameState::Playing;
        self.words = Some(words);
        self.start_time = Some(now_ms);
        for player in &mut self.players {
            player.reset_stats();
        }
        Ok(())
    }

    /// Moves the room from `playing` to `finished`.
    ///
    /// Returns `false` (and changes nothing) if no game is running,
    /// which makes repeated finish signals harmless.
    pub fn finish(&mut self) -> bool {
        if !self.game_state.can_transition_to(GameState::Finished) {
            return false;
        }
        self.game_state = GameState::Finished;
        self.start_time = None;
        true
    }

    /// Returns `true` if the room has members and all of them have
    /// reported completion.
    pub fn all_finished(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.finished)
    }

    /// Returns `true` if a running game should end now because every
    /// member finished and that is this room's finish trigger.
    pub fn should_auto_finish(&self) -> bool {
        self.game_state.is_playing()
            && self.finish_trigger() == FinishTrigger::AllPlayersFinished
            && self.all_finished()
    }

    /// Merges a settings patch. Only allowed while `waiting`.
    pub fn apply_settings(&mut self, patch: SettingsPatch) -> Result<RoomSettings, RoomError> {
        if self.game_state != GameState::Waiting {
            return Err(RoomError::InvalidState(
                "Settings can only be changed before the game starts".into(),
            ));
        }
        if patch.is_empty() {
            return Err(RoomError::InvalidSettings("no settings supplied".into()));
        }
        if patch.time_limit == Some(0) {
            return Err(RoomError::InvalidSettings("timeLimit must be positive".into()));
        }
        if patch.word_count == Some(0) {
            return Err(RoomError::InvalidSettings("wordCount must be positive".into()));
        }

        if let Some(time_limit) = patch.time_limit {
            self.settings.time_limit = time_limit;
        }
        if let Some(word_count) = patch.word_count {
            self.settings.word_count = word_count;
        }
        if let Some(game_mode) = patch.game_mode {
            self.settings.game_mode = game_mode;
        }
        Ok(self.settings)
    }

    /// The roster in join order.
    pub fn roster(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(Player::snapshot).collect()
    }

    /// The full view sent to a joiner.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.code.clone(),
            players: self.roster(),
            game_state: self.game_state,
            words: self.words.clone(),
            start_time: self.start_time,
            creator: self.creator,
            settings: self.settings,
        }
    }
}
