//! Room coordinator: applies client events to rooms and fans out the
//! resulting server events.
//!
//! The coordinator is synchronous. Every call runs to completion, and
//! all broadcasts for an event are sent after the room has been
//! mutated, so a client never sees a half-updated roster. Wrap it in
//! [`spawn_coordinator`](crate::spawn_coordinator) to share it between
//! connection tasks.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use typerace_protocol::{
    ClientEvent, PlayerId, ProgressReport, RoomCode, ServerEvent, SettingsPatch,
};

use crate::room::FinishTrigger;
use crate::{RoomError, RoomRegistry};

/// Chat messages longer than this many characters are cut.
pub const CHAT_MESSAGE_MAX_CHARS: usize = 200;

/// Channel sender for delivering events to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Who in a room receives a broadcast.
#[derive(Debug, Clone, Copy)]
enum Recipient {
    All,
    AllExcept(PlayerId),
}

/// Owns the [`RoomRegistry`] and the outbound channel of every
/// connected player.
pub struct RoomCoordinator {
    registry: RoomRegistry,
    senders: HashMap<PlayerId, PlayerSender>,
}

impl RoomCoordinator {
    /// Creates a coordinator over an existing registry.
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            registry,
            senders: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Number of connections with a registered outbound channel.
    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }

    /// Registers a connection's outbound channel and greets it with its id.
    pub fn connect(&mut self, player_id: PlayerId, sender: PlayerSender) {
        self.senders.insert(player_id, sender);
        self.send_to(player_id, ServerEvent::Connected { id: player_id });
        tracing::debug!(%player_id, "player connected");
    }

    /// Removes a connection from every room it is in, then forgets it.
    pub fn disconnect(&mut self, player_id: PlayerId) {
        for code in self.registry.rooms_of(player_id) {
            if let Err(err) = self.leave_room(player_id, code.clone()) {
                tracing::debug!(%player_id, room_id = %code, reason = %err, "leave on disconnect ignored");
            }
        }
        self.senders.remove(&player_id);
        tracing::debug!(%player_id, "player disconnected");
    }

    /// Applies one client event.
    ///
    /// Rejections the client should hear about become an `error` event
    /// to the caller. Events that refer to a room that is gone, or that
    /// the caller isn't in, are dropped.
    pub fn handle(&mut self, caller: PlayerId, event: ClientEvent) {
        let name = event.name();
        let room_id = event.room().clone();

        let result = match event {
            ClientEvent::JoinRoom { room, username } => self.join_room(caller, room, username),
            ClientEvent::StartGame { room, words } => self.start_game(caller, room, words),
            ClientEvent::UpdateProgress { room, report } => {
                self.update_progress(caller, room, report)
            }
            ClientEvent::TimeUp { room } => self.time_up(room),
            ClientEvent::PlayerReady { room, ready } => self.player_ready(caller, room, ready),
            ClientEvent::UpdateSettings { room, patch } => {
                self.update_settings(caller, room, patch)
            }
            ClientEvent::ChatMessage {
                room,
                message,
                username,
            } => self.chat_message(caller, room, &message, username),
            ClientEvent::LeaveRoom { room } => self.leave_room(caller, room),
        };

        if let Err(err) = result {
            if err.is_reported() {
                tracing::debug!(%caller, %room_id, event = name, error = %err, "event rejected");
                self.send_error(caller, err.to_string());
            } else {
                tracing::debug!(%caller, %room_id, event = name, reason = %err, "event ignored");
            }
        }
    }

    /// Sends an `error` event to one connection.
    pub fn send_error(&self, player_id: PlayerId, message: String) {
        self.send_to(player_id, ServerEvent::Error { message });
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn join_room(
        &mut self,
        caller: PlayerId,
        code: RoomCode,
        username: Option<String>,
    ) -> Result<(), RoomError> {
        let username = username.unwrap_or_else(|| caller.default_username());
        let (room, _created) = self.registry.get_or_create(code.clone(), caller);
        let player = room.upsert_player(caller, username).snapshot();
        let snapshot = room.snapshot();
        let settings = room.settings();

        tracing::info!(
            room_id = %code,
            player_id = %caller,
            username = %player.username,
            players = snapshot.players.len(),
            "player joined"
        );

        let players = snapshot.players.clone();
        self.send_to(caller, ServerEvent::RoomState(snapshot));
        self.broadcast(
            &code,
            Recipient::AllExcept(caller),
            ServerEvent::PlayerJoined {
                player,
                players,
                settings,
            },
        );
        Ok(())
    }

    fn start_game(
        &mut self,
        caller: PlayerId,
        code: RoomCode,
        words: String,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if !room.is_creator(caller) {
            return Err(RoomError::NotCreator {
                action: "start the game",
            });
        }

        let start_time = now_millis();
        room.start(words.clone(), start_time)?;
        let players = room.roster();
        let settings = room.settings();

        tracing::info!(
            room_id = %code,
            players = players.len(),
            mode = %settings.game_mode,
            "game started"
        );

        self.broadcast(
            &code,
            Recipient::All,
            ServerEvent::GameStarted {
                words,
                start_time,
                players,
                settings,
            },
        );
        Ok(())
    }

    fn update_progress(
        &mut self,
        caller: PlayerId,
        code: RoomCode,
        report: ProgressReport,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if !room.game_state().is_playing() {
            return Err(RoomError::NotPlaying(code));
        }
        let player = room
            .player_mut(caller)
            .ok_or_else(|| RoomError::NotInRoom(caller, code.clone()))?;
        player.apply(report);
        let players = room.roster();

        self.broadcast(
            &code,
            Recipient::All,
            ServerEvent::ProgressUpdate {
                player_id: caller,
                progress: report.progress,
                wpm: report.wpm,
                accuracy: report.accuracy,
                finished: report.finished,
                players,
            },
        );
        self.finish_if_all_done(&code);
        Ok(())
    }

    fn time_up(&mut self, code: RoomCode) -> Result<(), RoomError> {
        let room = self
            .registry
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        if room.finish_trigger() != FinishTrigger::TimeUp {
            tracing::debug!(room_id = %code, "time-up ignored: room finishes on completion");
            return Ok(());
        }
        if !room.finish() {
            tracing::debug!(room_id = %code, state = %room.game_state(), "time-up ignored");
            return Ok(());
        }
        let players = room.roster();

        tracing::info!(room_id = %code, "game finished");
        self.broadcast(&code, Recipient::All, ServerEvent::GameFinished { players });
        Ok(())
    }

    fn player_ready(
        &mut self,
        caller: PlayerId,
        code: RoomCode,
        ready: bool,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let player = room
            .player_mut(caller)
            .ok_or_else(|| RoomError::NotInRoom(caller, code.clone()))?;
        player.ready = ready;
        let players = room.roster();

        self.broadcast(
            &code,
            Recipient::All,
            ServerEvent::PlayerReadyUpdate {
                player_id: caller,
                ready,
                players,
            },
        );
        Ok(())
    }

    fn update_settings(
        &mut self,
        caller: PlayerId,
        code: RoomCode,
        patch: SettingsPatch,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if !room.is_creator(caller) {
            return Err(RoomError::NotCreator {
                action: "change settings",
            });
        }
        let settings = room.apply_settings(patch)?;

        tracing::info!(
            room_id = %code,
            time_limit = settings.time_limit,
            word_count = settings.word_count,
            mode = %settings.game_mode,
            "settings updated"
        );
        self.broadcast(&code, Recipient::All, ServerEvent::SettingsUpdated(settings));
        Ok(())
    }

    fn chat_message(
        &mut self,
        caller: PlayerId,
        code: RoomCode,
        message: &str,
        username: Option<String>,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let player = room
            .player(caller)
            .ok_or_else(|| RoomError::NotInRoom(caller, code.clone()))?;

        let message = message.trim();
        if message.is_empty() {
            return Ok(());
        }
        let message: String = message.chars().take(CHAT_MESSAGE_MAX_CHARS).collect();
        let username = username.unwrap_or_else(|| player.username.clone());

        self.broadcast(
            &code,
            Recipient::All,
            ServerEvent::NewChatMessage {
                username,
                message,
                timestamp: now_millis(),
            },
        );
        Ok(())
    }

    fn leave_room(&mut self, caller: PlayerId, code: RoomCode) -> Result<(), RoomError> {
        if !self.registry.contains(&code) {
            return Err(RoomError::NotFound(code));
        }
        let player = self
            .registry
            .remove_player(&code, caller)
            .ok_or_else(|| RoomError::NotInRoom(caller, code.clone()))?;

        // The room is gone if that was the last member.
        let Some(room) = self.registry.get(&code) else {
            return Ok(());
        };
        let players = room.roster();

        self.broadcast(
            &code,
            Recipient::All,
            ServerEvent::PlayerLeft {
                player_id: caller,
                username: player.username,
                players,
            },
        );
        self.finish_if_all_done(&code);
        Ok(())
    }

    /// Ends a running `words`-mode game once every member has finished.
    fn finish_if_all_done(&mut self, code: &RoomCode) {
        let Some(room) = self.registry.get_mut(code) else {
            return;
        };
        if !room.should_auto_finish() || !room.finish() {
            return;
        }
        let players = room.roster();

        tracing::info!(room_id = %code, "game finished: all players done");
        self.broadcast(code, Recipient::All, ServerEvent::GameFinished { players });
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Sends an event to the current members of a room.
    fn broadcast(&self, code: &RoomCode, recipient: Recipient, event: ServerEvent) {
        let Some(room) = self.registry.get(code) else {
            return;
        };
        for player in room.players() {
            match recipient {
                Recipient::AllExcept(excluded) if player.id == excluded => continue,
                _ => self.send_to(player.id, event.clone()),
            }
        }
    }

    /// Sends an event to one connection. Drops it silently if the
    /// connection is gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
