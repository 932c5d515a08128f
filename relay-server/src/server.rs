//! Connection Handling
//!
//! One task per WebSocket client. Frames are parsed just far enough to route
//! them (`type`, `roomId`, `targetId`); everything else, including the
//! `webrtc:signal` payloads, is forwarded opaquely.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use rand::Rng;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::rooms::Registry;

pub type SharedRegistry = Arc<RwLock<Registry>>;

/// Random identifier the relay assigns to each connection
fn generate_client_id() -> String {
    use rand::distributions::Alphanumeric;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

fn send_error(outbox: &mpsc::UnboundedSender<String>, message: &str) {
    let _ = outbox.send(json!({"type": "error", "message": message}).to_string());
}

/// Serve one client until it disconnects
pub async fn handle_connection(registry: SharedRegistry, stream: TcpStream, addr: SocketAddr) {
    let socket = match accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("Handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let client_id = generate_client_id();
    info!("Client {} connected from {}", client_id, addr);

    let (mut sink, mut stream) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<String>();

    // Writer: drains the outbox until every sender (this task and the room
    // registry) is gone.
    tokio::spawn(async move {
        while let Some(frame) = outbox_rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let _ = outbox.send(json!({"type": "hello", "clientId": client_id}).to_string());

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_frame(&registry, &client_id, &outbox, &text),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read error from {}: {}", client_id, e);
                break;
            }
        }
    }

    if let Some(departure) = registry.write().remove_client(&client_id) {
        info!("Client {} left room {}", client_id, departure.room_id);
        if departure.was_host {
            // The room is over without its host; tell everyone still in it.
            let frame = json!({"type": "error", "message": "Host left the room"}).to_string();
            for member in departure.remaining {
                let _ = member.send(frame.clone());
            }
        }
    } else {
        info!("Client {} disconnected", client_id);
    }
}

fn handle_frame(
    registry: &SharedRegistry,
    client_id: &str,
    outbox: &mpsc::UnboundedSender<String>,
    text: &str,
) {
    let mut value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!("Malformed frame from {}: {}", client_id, e);
            send_error(outbox, "malformed message");
            return;
        }
    };
    let Some(msg_type) = value.get("type").and_then(Value::as_str).map(String::from) else {
        send_error(outbox, "missing message type");
        return;
    };

    match msg_type.as_str() {
        "room:create" => {
            let Some(room_id) = value.get("roomId").and_then(Value::as_str) else {
                send_error(outbox, "missing roomId");
                return;
            };
            match registry
                .write()
                .create_room(room_id, client_id, outbox.clone())
            {
                Ok(()) => {
                    info!("Client {} created room {}", client_id, room_id);
                    let _ = outbox.send(json!({"type": "room:created"}).to_string());
                }
                Err(e) => send_error(outbox, e.message()),
            }
        }

        "room:join" => {
            let Some(room_id) = value.get("roomId").and_then(Value::as_str) else {
                send_error(outbox, "missing roomId");
                return;
            };
            match registry
                .write()
                .join_room(room_id, client_id, outbox.clone())
            {
                Ok(outcome) => {
                    info!(
                        "Client {} joined room {} (host: {})",
                        client_id, room_id, outcome.host
                    );
                    let _ = outbox
                        .send(json!({"type": "room:joined", "host": outcome.host}).to_string());
                    if let Some(host) = outcome.host_outbox {
                        let _ = host
                            .send(json!({"type": "webrtc:new-peer", "peerId": client_id}).to_string());
                    }
                }
                Err(e) => send_error(outbox, e.message()),
            }
        }

        "webrtc:signal" => {
            let Some(target) = value.get("targetId").and_then(Value::as_str).map(String::from)
            else {
                send_error(outbox, "missing targetId");
                return;
            };
            value["fromId"] = Value::String(client_id.to_string());
            match registry.read().member_of(client_id, &target) {
                Some(recipient) => {
                    let _ = recipient.send(value.to_string());
                }
                None => debug!("Dropping signal from {} for unknown target {}", client_id, target),
            }
        }

        "sync:request" => match registry.read().host_of(client_id) {
            Some(host) => {
                let _ = host.send(text.to_string());
            }
            None => debug!("sync:request from {} outside any room", client_id),
        },

        "sync:state" => {
            let Some(target) = value.get("targetId").and_then(Value::as_str) else {
                send_error(outbox, "missing targetId");
                return;
            };
            match registry.read().member_of(client_id, target) {
                Some(recipient) => {
                    let _ = recipient.send(text.to_string());
                }
                None => debug!("Dropping snapshot for unknown target {}", target),
            }
        }

        t if t.starts_with("control:") || t == "playlist:update" => {
            for peer in registry.read().peers_of(client_id) {
                let _ = peer.send(text.to_string());
            }
        }

        other => send_error(outbox, &format!("unsupported message type: {}", other)),
    }
}
