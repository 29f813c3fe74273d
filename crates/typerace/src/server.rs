//! `TyperaceServer` builder and server loop.
//!
//! This ties the layers together: transport → protocol → room
//! coordinator.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use typerace_protocol::{Codec, JsonCodec};
use typerace_room::{spawn_coordinator, CoordinatorHandle, RoomRegistry};
use typerace_transport::{Handshake, Transport, WebSocketHandshake, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ServerConfig, TyperaceError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) codec: C,
    pub(crate) keepalive_interval: Duration,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for configuring and starting a Typerace server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), typerace::TyperaceError> {
/// use typerace::TyperaceServer;
///
/// let server = TyperaceServer::builder()
///     .bind("127.0.0.1:4000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TyperaceServerBuilder {
    config: ServerConfig,
}

impl TyperaceServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_address = addr.to_string();
        self
    }

    /// Sets how often connections are pinged to detect dead peers.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.config.keepalive_interval = interval;
        self
    }

    /// Sets how long a new peer has to complete the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets the coordinator command queue size.
    pub fn command_buffer(mut self, size: usize) -> Self {
        self.config.command_buffer = size;
        self
    }

    /// Binds the listener and starts the room coordinator, using JSON
    /// text frames.
    pub async fn build(self) -> Result<TyperaceServer<JsonCodec>, TyperaceError> {
        self.build_with_codec(JsonCodec).await
    }

    /// Like [`build`](Self::build), with a custom codec.
    pub async fn build_with_codec<C: Codec>(
        self,
        codec: C,
    ) -> Result<TyperaceServer<C>, TyperaceError> {
        let transport = WebSocketTransport::bind(&self.config.bind_address).await?;
        let coordinator = spawn_coordinator(RoomRegistry::new(), self.config.command_buffer);

        let state = Arc::new(ServerState {
            coordinator,
            codec,
            keepalive_interval: self.config.keepalive_interval,
            handshake_timeout: self.config.handshake_timeout,
        });

        Ok(TyperaceServer { transport, state })
    }
}

/// A bound Typerace server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TyperaceServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl TyperaceServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> TyperaceServerBuilder {
        TyperaceServerBuilder::new()
    }
}

impl<C: Codec> TyperaceServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TyperaceError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns a handle to the room coordinator.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.state.coordinator.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), TyperaceError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops the
    /// coordinator.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), TyperaceError> {
        tracing::info!(addr = %self.local_addr()?, "Typerace server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(handshake) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(upgrade_and_handle(handshake, state));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("Typerace server shutting down");
        self.state.coordinator.shutdown().await?;
        Ok(())
    }
}

/// Completes the WebSocket upgrade off the accept loop, then serves the
/// connection. Peers that stall the upgrade are dropped after
/// `handshake_timeout`.
async fn upgrade_and_handle<C: Codec>(
    handshake: WebSocketHandshake,
    state: Arc<ServerState<C>>,
) {
    let peer = handshake.peer_addr();
    let conn = match tokio::time::timeout(state.handshake_timeout, handshake.complete()).await {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            tracing::debug!(%peer, error = %e, "handshake failed");
            return;
        }
        Err(_) => {
            tracing::debug!(%peer, "handshake timed out");
            return;
        }
    };

    if let Err(e) = handle_connection(conn, state).await {
        tracing::debug!(error = %e, "connection ended with error");
    }
}
