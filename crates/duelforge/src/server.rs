//! `DuelforgeServer` builder and accept loop.
//!
//! This is the entry point for running a Duelforge server. It ties
//! together all the layers: protocol → session → room → game.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use duelforge_game::GameRules;
use duelforge_room::{RoomConfig, RoomManager};
use duelforge_session::{SessionConfig, SessionRegistry};

use crate::handler::handle_connection;
use crate::DuelforgeError;

/// Everything tunable about a server, with playable defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the TCP listener binds to.
    pub bind_addr: String,
    /// Heartbeat and idle-timeout settings for connections.
    pub session: SessionConfig,
    /// Room capacity and sweeper cadence.
    pub room: RoomConfig,
    /// Deck composition and duel rules.
    pub rules: GameRules,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9527".to_string(),
            session: SessionConfig::default(),
            room: RoomConfig::default(),
            rules: GameRules::default(),
        }
    }
}

/// Shared server state passed to each connection handler task.
///
/// Owns the registries top-down: the server state holds the session
/// registry and the room manager, the room manager holds a second
/// handle to the session registry for delivery, and nothing below
/// holds a handle back up.
pub(crate) struct ServerState {
    pub(crate) config: ServerConfig,
    pub(crate) sessions: Arc<SessionRegistry>,
    pub(crate) rooms: Arc<RoomManager>,
}

/// Builder for configuring and starting a Duelforge server.
///
/// # Example
///
/// ```rust,ignore
/// use duelforge::prelude::*;
///
/// let server = DuelforgeServer::builder()
///     .bind("0.0.0.0:9527")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct DuelforgeServerBuilder {
    config: ServerConfig,
}

impl DuelforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the heartbeat and idle-timeout configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the room capacity and sweeper configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Sets the duel rules new games start with.
    pub fn rules(mut self, rules: GameRules) -> Self {
        self.config.rules = rules;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// The socket is bound here rather than in [`DuelforgeServer::run`]
    /// so that callers binding port 0 can read the real address back
    /// before the accept loop starts.
    pub async fn build(self) -> Result<DuelforgeServer, DuelforgeError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;

        let sessions = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomManager::new(
            self.config.room.clone(),
            self.config.rules.clone(),
            Arc::clone(&sessions),
        ));

        let state = Arc::new(ServerState {
            config: self.config,
            sessions,
            rooms,
        });

        Ok(DuelforgeServer { listener, state })
    }
}

impl Default for DuelforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Duelforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DuelforgeServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl DuelforgeServer {
    /// Creates a new builder.
    pub fn builder() -> DuelforgeServerBuilder {
        DuelforgeServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Starts the empty-room sweeper, then accepts incoming
    /// connections and spawns a handler task for each. A failed accept
    /// is logged and the loop keeps going. Runs until the process is
    /// terminated.
    pub async fn run(self) -> Result<(), DuelforgeError> {
        let _sweeper = Arc::clone(&self.state.rooms).spawn_sweeper();

        let addr = self.listener.local_addr()?;
        tracing::info!(%addr, "duelforge server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, state).await {
                            tracing::debug!(
                                %peer,
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
