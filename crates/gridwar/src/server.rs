//! `GridwarServer` builder and server loop.
//!
//! This is the entry point for running a Gridwar server. It ties together
//! all the layers: transport → protocol → registry → engine.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gridwar_engine::GameConfig;
use gridwar_protocol::{Codec, JsonCodec};
use gridwar_registry::{RegistryConfig, SessionRegistry};
use gridwar_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::GridwarError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) codec: C,
    /// Rules for sessions this server creates.
    pub(crate) game_config: GameConfig,
    /// Close a connection after this long without an inbound message.
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a Gridwar server.
///
/// # Example
///
/// ```rust,no_run
/// use gridwar::prelude::*;
///
/// # async fn start() -> Result<(), GridwarError> {
/// let server = GridwarServer::builder()
///     .bind("0.0.0.0:8000")
///     .game_config(GameConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GridwarServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    registry_config: RegistryConfig,
    idle_timeout: Option<Duration>,
}

impl GridwarServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            game_config: GameConfig::default(),
            registry_config: RegistryConfig::default(),
            idle_timeout: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules used for every new session.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets the session actor settings.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Closes connections that stay silent for `timeout`. `None` (the
    /// default) never times out; turn-based players can think for a while.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener and returns a server ready to [`run`](GridwarServer::run).
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<GridwarServer<JsonCodec>, GridwarError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(SessionRegistry::new(self.registry_config)),
            codec: JsonCodec,
            game_config: self.game_config.validated(),
            idle_timeout: self.idle_timeout,
        });

        Ok(GridwarServer { transport, state })
    }
}

impl Default for GridwarServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gridwar server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GridwarServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GridwarServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GridwarServerBuilder {
        GridwarServerBuilder::new()
    }
}

impl<C: Codec> GridwarServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, GridwarError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated or the listener stops.
    pub async fn run(mut self) -> Result<(), GridwarError> {
        tracing::info!(
            board_size = self.state.game_config.board_size,
            units_per_player = self.state.game_config.units_per_player,
            "Gridwar server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    self.state.registry.lock().await.prune();
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    // Per-socket failures are handled inside the transport;
                    // an error here means the listener itself is gone.
                    tracing::error!(error = %e, "accept failed, stopping server");
                    return Err(e.into());
                }
            }
        }
    }
}
