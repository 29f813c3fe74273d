//! Room registry: the table of live rooms, keyed by room code.

use std::collections::HashMap;

use typerace_protocol::{PlayerId, RoomCode};

use crate::room::{Player, Room};

/// Owns every live room.
///
/// A room exists exactly while it has at least one member, with one
/// exception: a room created by a join exists before the joiner is
/// added. Removing the last player deletes the room in the same call.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room for `code`, creating it with `creator` as owner
    /// if it doesn't exist. The flag is `true` when the room was created.
    pub fn get_or_create(&mut self, code: RoomCode, creator: PlayerId) -> (&mut Room, bool) {
        let mut created = false;
        let room = self.rooms.entry(code).or_insert_with_key(|code| {
            created = true;
            tracing::info!(room_id = %code, %creator, "room created");
            Room::new(code.clone(), creator)
        });
        (room, created)
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Deletes a room outright, whatever its roster.
    pub fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code)?;
        tracing::info!(room_id = %code, "room deleted");
        Some(room)
    }

    /// Removes a player from a room, deleting the room if that left it
    /// empty. Returns the removed entry, or `None` if the room or the
    /// player wasn't there.
    pub fn remove_player(&mut self, code: &RoomCode, player_id: PlayerId) -> Option<Player> {
        let room = self.rooms.get_mut(code)?;
        let player = room.remove_player(player_id)?;
        tracing::info!(
            room_id = %code,
            %player_id,
            players = room.len(),
            "player removed"
        );
        if room.is_empty() {
            self.remove(code);
        }
        Some(player)
    }

    /// Every room the player is currently a member of.
    pub fn rooms_of(&self, player_id: PlayerId) -> Vec<RoomCode> {
        self.rooms
            .values()
            .filter(|room| room.contains(player_id))
            .map(|room| room.code().clone())
            .collect()
    }

    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
