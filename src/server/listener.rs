//! Socket server listener
//!
//! Handles the TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::hub::Hub;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::store::MessageStore;

/// Real-time socket server
pub struct SocketServer {
    config: ServerConfig,
    hub: Arc<Hub>,
    store: Arc<dyn MessageStore>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl SocketServer {
    /// Create a new server with the given configuration and record store
    pub fn new(config: ServerConfig, store: Arc<dyn MessageStore>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            hub: Arc::new(Hub::new()),
            store,
            connection_semaphore,
        }
    }

    /// Get a reference to the hub
    ///
    /// Lets the embedding application push events from outside the socket
    /// layer, e.g. notifications raised by HTTP request handlers.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Socket server listening");

        let stats_handle = self.spawn_stats_task();
        let result = self.accept_loop(&listener).await;
        stats_handle.abort();
        result
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Socket server listening");

        let stats_handle = self.spawn_stats_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        stats_handle.abort();
        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let _permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let conn_id = self.hub.allocate_conn_id();

        tracing::debug!(conn = %conn_id, peer = %peer_addr, "New connection");

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let config = self.config.clone();
        let hub = Arc::clone(&self.hub);
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            let _permit = _permit;
            let connection = Connection::new(conn_id, socket, peer_addr, config, hub, store);

            if let Err(e) = connection.run().await {
                tracing::debug!(conn = %conn_id, error = %e, "Connection error");
            }

            tracing::debug!(conn = %conn_id, "Connection closed");
        });
    }

    fn spawn_stats_task(&self) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(&self.hub);
        let interval = self.config.stats_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately, skip it
            loop {
                ticker.tick().await;
                let stats = hub.stats().await;
                tracing::info!(
                    connections = stats.connections,
                    online_users = stats.online_users,
                    live_rooms = stats.live_rooms,
                    group_rooms = stats.group_rooms,
                    "Server stats"
                );
            }
        })
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
