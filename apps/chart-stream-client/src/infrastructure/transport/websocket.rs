//! WebSocket Adapter
//!
//! Owns the upstream socket. Outbound commands from every session funnel
//! through one unbounded channel into a writer task; inbound text frames are
//! decoded and routed through the [`SessionTable`] by the read loop.

use std::sync::Arc;

use futures_util::stream::{SplitStream, StreamExt};
use futures_util::SinkExt;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::application::ports::CommandSink;
use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::protocol::FrameCodec;
use crate::infrastructure::transport::SessionTable;

/// Errors surfaced by the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The upstream connection could not be established or was lost.
    #[error("websocket failure: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

// =============================================================================
// Transport
// =============================================================================

type SocketReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A connected upstream socket plus the channel all sessions write through.
pub struct WebSocketTransport {
    reader: SocketReader,
    sink: Arc<WebSocketSink>,
    sessions: SessionTable,
}

impl WebSocketTransport {
    /// Connect to the configured endpoint and spawn the writer task.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::WebSocket`] when the handshake fails.
    pub async fn connect(
        config: &ClientConfig,
        sessions: SessionTable,
    ) -> Result<Self, TransportError> {
        info!(url = %config.url, "connecting to chart endpoint");
        let (socket, response) = connect_async(config.url.as_str()).await?;
        debug!(status = %response.status(), "websocket handshake complete");

        let (mut writer, reader) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                trace!(%frame, "sending frame");
                if let Err(error) = writer.send(Message::Text(frame.into())).await {
                    warn!(%error, "websocket write failed; stopping writer");
                    break;
                }
            }
        });

        Ok(Self {
            reader,
            sink: Arc::new(WebSocketSink { tx }),
            sessions,
        })
    }

    /// The command sink sessions send through.
    #[must_use]
    pub fn sink(&self) -> Arc<WebSocketSink> {
        Arc::clone(&self.sink)
    }

    /// Drive the read loop until the upstream closes or fails.
    ///
    /// Undecodable frames and packets addressed to unknown sessions are
    /// logged and skipped; the loop only stops on connection-level events.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::WebSocket`] when the connection errors out.
    pub async fn run(mut self) -> Result<(), TransportError> {
        let codec = FrameCodec::new();
        while let Some(message) = self.reader.next().await {
            match message? {
                Message::Text(text) => match codec.decode(&text) {
                    Ok(packet) => {
                        if !self.sessions.dispatch(packet) {
                            trace!(frame = %text, "dropping packet for unknown session");
                        }
                    }
                    Err(error) => {
                        warn!(%error, frame = %text, "failed to decode inbound frame");
                    }
                },
                Message::Close(frame) => {
                    info!(?frame, "upstream closed the connection");
                    return Ok(());
                }
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
            }
        }
        info!("upstream stream ended");
        Ok(())
    }
}

// =============================================================================
// Sink
// =============================================================================

/// Fire-and-forget command sink backed by the writer task's channel.
pub struct WebSocketSink {
    tx: mpsc::UnboundedSender<String>,
}

impl CommandSink for WebSocketSink {
    fn send(&self, command: &str, arguments: Vec<Value>) {
        match FrameCodec::new().encode(command, &arguments) {
            Ok(frame) => {
                if self.tx.send(frame).is_err() {
                    warn!(%command, "writer task gone; dropping command");
                }
            }
            Err(error) => warn!(%command, %error, "failed to encode command"),
        }
    }
}
