//! Coordinator actor: runs a [`RoomCoordinator`] inside a Tokio task.
//!
//! Connection tasks never touch room state directly. They send commands
//! through a [`CoordinatorHandle`], and the actor applies them one at a
//! time, so each event's mutation and broadcasts happen together.

use tokio::sync::{mpsc, oneshot};
use typerace_protocol::{ClientEvent, GameState, PlayerId, RoomCode};

use crate::{PlayerSender, RoomCoordinator, RoomError, RoomRegistry};

/// Commands sent to the coordinator actor.
///
/// Variants with a `reply` field expect an answer on that oneshot.
pub(crate) enum CoordinatorCommand {
    /// Register a new connection.
    Connect {
        player_id: PlayerId,
        sender: PlayerSender,
    },

    /// Apply a client event.
    Event {
        caller: PlayerId,
        event: ClientEvent,
    },

    /// Report a rejected frame back to one connection.
    Reject { player_id: PlayerId, message: String },

    /// Remove a connection from every room.
    Disconnect { player_id: PlayerId },

    /// Look up one room's metadata.
    RoomInfo {
        code: RoomCode,
        reply: oneshot::Sender<Option<RoomInfo>>,
    },

    /// Count live rooms.
    RoomCount { reply: oneshot::Sender<usize> },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub game_state: GameState,
    pub player_count: usize,
    pub creator: PlayerId,
}

/// Handle to the running coordinator. Cheap to clone.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    /// Registers a connection. It receives `connected` on `sender`.
    pub async fn connect(&self, player_id: PlayerId, sender: PlayerSender) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::Connect { player_id, sender })
            .await
    }

    /// Submits a client event (fire-and-forget).
    pub async fn dispatch(&self, caller: PlayerId, event: ClientEvent) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::Event { caller, event }).await
    }

    /// Sends `error{message}` to one connection, in order with its
    /// other outbound events.
    pub async fn reject(&self, player_id: PlayerId, message: String) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::Reject { player_id, message })
            .await
    }

    /// Removes a connection from every room and drops its channel.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::Disconnect { player_id }).await
    }

    /// Returns metadata for one room, or `None` if it doesn't exist.
    pub async fn room_info(&self, code: RoomCode) -> Result<Option<RoomInfo>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordinatorCommand::RoomInfo {
            code,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordinatorCommand::RoomCount { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(CoordinatorCommand::Shutdown).await
    }

    async fn send(&self, cmd: CoordinatorCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

struct CoordinatorActor {
    coordinator: RoomCoordinator,
    receiver: mpsc::Receiver<CoordinatorCommand>,
}

impl CoordinatorActor {
    async fn run(mut self) {
        tracing::info!("room coordinator started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                CoordinatorCommand::Connect { player_id, sender } => {
                    self.coordinator.connect(player_id, sender);
                }
                CoordinatorCommand::Event { caller, event } => {
                    self.coordinator.handle(caller, event);
                }
                CoordinatorCommand::Reject { player_id, message } => {
                    self.coordinator.send_error(player_id, message);
                }
                CoordinatorCommand::Disconnect { player_id } => {
                    self.coordinator.disconnect(player_id);
                }
                CoordinatorCommand::RoomInfo { code, reply } => {
                    let info = self.coordinator.registry().get(&code).map(|room| RoomInfo {
                        code: room.code().clone(),
                        game_state: room.game_state(),
                        player_count: room.len(),
                        creator: room.creator(),
                    });
                    let _ = reply.send(info);
                }
                CoordinatorCommand::RoomCount { reply } => {
                    let _ = reply.send(self.coordinator.registry().len());
                }
                CoordinatorCommand::Shutdown => {
                    tracing::info!("room coordinator shutting down");
                    break;
                }
            }
        }

        tracing::info!(
            rooms = self.coordinator.registry().len(),
            "room coordinator stopped"
        );
    }
}

/// Spawns the coordinator actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_coordinator(registry: RoomRegistry, channel_size: usize) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = CoordinatorActor {
        coordinator: RoomCoordinator::new(registry),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    CoordinatorHandle { sender: tx }
}
