//! Per-connection I/O loop
//!
//! Each accepted socket is split into a reader half driven by this loop and a
//! writer half fed by the connection's unbounded outbound channel. The hub
//! never touches the socket: it pushes events into the channel and the writer
//! task serializes them in order.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::hub::Hub;
use crate::protocol::codec::{encode_event, LineCodec};
use crate::protocol::{ConnId, ErrorKind, ServerEvent};
use crate::server::config::ServerConfig;
use crate::server::gateway::{self, Flow};
use crate::session::SessionState;
use crate::store::MessageStore;

/// A single client connection
pub struct Connection {
    session: SessionState,
    socket: TcpStream,
    config: ServerConfig,
    hub: Arc<Hub>,
    store: Arc<dyn MessageStore>,
}

impl Connection {
    /// Create a connection handler for an accepted socket
    pub fn new(
        conn_id: ConnId,
        socket: TcpStream,
        peer_addr: std::net::SocketAddr,
        config: ServerConfig,
        hub: Arc<Hub>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            session: SessionState::new(conn_id, peer_addr),
            socket,
            config,
            hub,
            store,
        }
    }

    /// Drive the connection until the client disconnects or logs out
    ///
    /// The disconnect sweep runs on every exit path, including read errors.
    pub async fn run(mut self) -> Result<()> {
        let conn = self.session.conn_id;
        let (mut reader, mut writer) = self.socket.into_split();

        let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
        self.hub.attach(conn, tx).await;

        let writer_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let frame = match encode_event(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode outbound event");
                        continue;
                    }
                };
                if writer.write_all(&frame).await.is_err() {
                    break;
                }
            }
        });

        let mut codec =
            LineCodec::with_limits(self.config.read_buffer_size, self.config.max_frame_size);
        let result = loop {
            match reader.read_buf(codec.read_buf()).await {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            }

            let mut close = false;
            while let Some(parsed) = codec.next_event() {
                match parsed {
                    Ok(event) => {
                        if gateway::dispatch(event, &mut self.session, &self.hub, &self.store)
                            .await
                            == Flow::Close
                        {
                            close = true;
                            break;
                        }
                    }
                    Err(e @ crate::error::Error::FrameTooLarge { .. }) => {
                        // Oversized line: reject and drop the connection
                        tracing::warn!(conn = %conn, error = %e, "Frame size limit exceeded");
                        self.hub
                            .send_to(
                                conn,
                                ServerEvent::error(ErrorKind::InvalidState, "Event too large"),
                            )
                            .await;
                        close = true;
                        break;
                    }
                    Err(e) => {
                        // Malformed frame: tell the client, keep the connection
                        tracing::debug!(conn = %conn, error = %e, "Unparseable event");
                        self.hub
                            .send_to(
                                conn,
                                ServerEvent::error(ErrorKind::InvalidState, "Malformed event"),
                            )
                            .await;
                    }
                }
            }
            if close {
                break Ok(());
            }
        };

        // The sweep drops this connection's sender, closing the outbound
        // channel; awaiting the writer lets queued frames flush first.
        self.hub.disconnect(conn).await;
        let _ = writer_task.await;

        tracing::debug!(
            conn = %conn,
            duration = ?self.session.duration(),
            "Connection finished"
        );
        result
    }
}
