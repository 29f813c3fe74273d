//! Per-connection handler: greeting, event decoding, and outbound writes.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the coordinator → client receives `connected{id}`
//!   2. Spawn a writer task draining the connection's outbound channel
//!   3. Loop: receive frames → decode → hand events to the coordinator,
//!      while pinging the peer on a fixed interval
//!   4. When the peer closes or a ping fails, the guard removes the player
//!      from every room
//!
//! Silence alone never ends a connection: a player may watch a race
//! without sending anything.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use typerace_protocol::{decode_client_event, Codec, Frame, PlayerId, ServerEvent};
use typerace_room::CoordinatorHandle;
use typerace_transport::{Connection, WebSocketConnection};

use crate::server::ServerState;
use crate::TyperaceError;

/// Drop guard that disconnects a player when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async send.
struct ConnectionGuard {
    player_id: PlayerId,
    coordinator: CoordinatorHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.disconnect(player_id).await {
                tracing::debug!(%player_id, error = %e, "disconnect not delivered");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TyperaceError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let player_id = PlayerId::from(conn_id);
    tracing::info!(%conn_id, %player_id, peer = %conn.peer_addr(), "connection accepted");

    let (tx, rx) = mpsc::unbounded_channel();
    state.coordinator.connect(player_id, tx).await?;
    let _guard = ConnectionGuard {
        player_id,
        coordinator: state.coordinator.clone(),
    };

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));
    let result = tokio::select! {
        result = read_loop(&conn, &state, player_id) => result,
        () = keepalive(&conn, state.keepalive_interval, player_id) => Ok(()),
    };

    writer.abort();
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    tracing::info!(%conn_id, %player_id, "connection closed");

    // _guard drops here → player leaves every room.
    result
}

/// Reads frames until the peer closes or the transport errors.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    player_id: PlayerId,
) -> Result<(), TyperaceError> {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                return Ok(());
            }
        };

        match decode_client_event(&state.codec, &data) {
            Ok(event) => {
                tracing::debug!(%player_id, event = event.name(), room_id = %event.room(), "event received");
                state.coordinator.dispatch(player_id, event).await?;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "rejected frame");
                state.coordinator.reject(player_id, e.to_string()).await?;
            }
        }
    }
}

/// Pings the peer every `interval`; returns once a ping can't be written.
async fn keepalive(conn: &WebSocketConnection, interval: Duration, player_id: PlayerId) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // fires immediately

    loop {
        ticker.tick().await;
        if let Err(e) = conn.ping().await {
            tracing::info!(%player_id, error = %e, "keepalive failed, dropping connection");
            return;
        }
    }
}

/// Encodes and sends every event queued for this connection.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let frame = match state.codec.encode_frame(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(%conn_id, event = event.name(), error = %e, "failed to encode event");
                continue;
            }
        };
        let sent = match frame {
            Frame::Text(text) => conn.send_text(&text).await,
            Frame::Binary(bytes) => conn.send(&bytes).await,
        };
        if let Err(e) = sent {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
