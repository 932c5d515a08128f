//! Signaling Channel
//!
//! Persistent, ordered, bidirectional WebSocket connection to the relay.
//! A background task owns the socket; callers hold a cloneable handle for
//! sending and an event receiver for inbound traffic.

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::sync::WireMessage;

/// Signaling-related errors
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("failed to connect to relay: {0}")]
    Connect(String),

    #[error("signaling channel closed")]
    Closed,
}

/// Events emitted by the signaling channel
#[derive(Debug)]
pub enum ChannelEvent {
    /// A well-formed inbound message
    Message(WireMessage),
    /// An inbound frame that did not parse; surfaced, never fatal
    Protocol(String),
    /// The connection to the relay is gone
    Closed,
}

/// Handle for sending messages over the channel
#[derive(Clone)]
pub struct ChannelHandle {
    outbound_tx: mpsc::UnboundedSender<WireMessage>,
}

impl ChannelHandle {
    pub fn send(&self, message: WireMessage) -> Result<(), SignalingError> {
        self.outbound_tx
            .send(message)
            .map_err(|_| SignalingError::Closed)
    }
}

/// Connects to the relay and runs the socket in background tasks
pub struct SignalingChannel;

impl SignalingChannel {
    /// Open the channel. Returns a send handle and the inbound event stream.
    pub async fn connect(
        url: &str,
    ) -> Result<(ChannelHandle, mpsc::UnboundedReceiver<ChannelEvent>), SignalingError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| SignalingError::Connect(e.to_string()))?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<WireMessage>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        // Writer: serialize and push outbound messages until the handle drops.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode outbound message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!("Relay send failed: {}", e);
                    break;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
        });

        // Reader: decode inbound frames into events.
        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<WireMessage>(&text) {
                            Ok(message) => {
                                debug!("Relay message: {:?}", message);
                                if event_tx.send(ChannelEvent::Message(message)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Malformed relay frame: {}", e);
                                let _ = event_tx
                                    .send(ChannelEvent::Protocol(format!("bad frame: {}", e)));
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Relay closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay read error: {}", e);
                        break;
                    }
                }
            }
            let _ = event_tx.send(ChannelEvent::Closed);
        });

        Ok((ChannelHandle { outbound_tx }, event_rx))
    }
}
