//! Room Session
//!
//! The object the embedding application holds. Owns the signaling channel,
//! the playback state store and the peer negotiation manager, and runs the
//! single event loop where all state mutation happens: channel events, local
//! intents and peer events are applied one at a time, so the store needs no
//! locking.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::network::{ChannelEvent, ChannelHandle, RoomId, SignalingChannel, SignalingError};
use crate::peer::{MediaSource, PeerError, PeerEvent, PeerManager};
use crate::sync::{
    handle_intent, handle_message, ClientRole, Effects, LocalIntent, PlayerCommand, SessionState,
    SignalPayload, StateSnapshot, WireMessage,
};

/// Delay before resuming after a seek-triggered resync pulse
const RESYNC_DELAY: Duration = Duration::from_millis(50);

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL of the relay server
    pub relay_url: String,
    /// ICE servers for peer negotiation
    pub ice_servers: Vec<String>,
    /// How long a peer may stay in negotiation before teardown
    pub negotiation_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:8765".to_string(),
            ice_servers: vec!["stun:stun.l.google.com:19302".to_string()],
            negotiation_timeout: Duration::from_secs(30),
        }
    }
}

/// Whether to create the room or join an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Create,
    Join,
}

/// Callback interface the presentation layer implements
pub trait SessionCallback: Send + Sync {
    /// Playlist, cursor, flags or role changed; re-render
    fn on_state_changed(&self, snapshot: StateSnapshot, role: ClientRole);
    /// Drive the local media element (host playback or listener output)
    fn on_player(&self, command: PlayerCommand);
    /// Transient user-visible message
    fn on_notice(&self, message: String);
    /// Listener only: the host's media stream started arriving
    fn on_remote_track(&self, peer_id: String);
    /// The relay connection is gone; the session is over
    fn on_disconnected(&self);
}

/// Session-level errors
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Peer(#[from] PeerError),
}

/// A live room session
pub struct Session {
    intent_tx: mpsc::UnboundedSender<LocalIntent>,
    task: JoinHandle<()>,
}

impl Session {
    /// Connect to the relay, create or join `room_id`, and start the event
    /// loop. `media` is the host's capture source; listeners pass one too but
    /// it is never captured on their side.
    pub async fn connect(
        config: SessionConfig,
        room_id: RoomId,
        mode: JoinMode,
        media: Arc<MediaSource>,
        callback: Arc<dyn SessionCallback>,
    ) -> Result<Self, CoreError> {
        let (channel, channel_events) = SignalingChannel::connect(&config.relay_url).await?;

        channel.send(match mode {
            JoinMode::Create => WireMessage::RoomCreate {
                room_id: room_id.as_str().to_string(),
            },
            JoinMode::Join => WireMessage::RoomJoin {
                room_id: room_id.as_str().to_string(),
            },
        })?;

        let (peer_signal_tx, peer_signal_rx) = mpsc::unbounded_channel();
        let (peer_event_tx, peer_event_rx) = mpsc::unbounded_channel();
        let peers = PeerManager::new(
            config.ice_servers.clone(),
            config.negotiation_timeout,
            media,
            peer_signal_tx,
            peer_event_tx,
        )?;

        let (intent_tx, intent_rx) = mpsc::unbounded_channel();

        let context = RunContext {
            state: SessionState::new(room_id),
            peers,
            channel,
            callback,
        };
        let task = tokio::spawn(run_loop(
            context,
            channel_events,
            intent_rx,
            peer_signal_rx,
            peer_event_rx,
        ));

        Ok(Self { intent_tx, task })
    }

    /// Forward a user intent from the presentation layer
    pub fn submit(&self, intent: LocalIntent) {
        let _ = self.intent_tx.send(intent);
    }

    /// Leave the room and wait for all peer connections to close
    pub async fn leave(self) {
        let Session { intent_tx, task } = self;
        drop(intent_tx);
        let _ = task.await;
    }
}

struct RunContext {
    state: SessionState,
    peers: PeerManager,
    channel: ChannelHandle,
    callback: Arc<dyn SessionCallback>,
}

async fn run_loop(
    mut ctx: RunContext,
    mut channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
    mut intents: mpsc::UnboundedReceiver<LocalIntent>,
    mut peer_signals: mpsc::UnboundedReceiver<WireMessage>,
    mut peer_events: mpsc::UnboundedReceiver<PeerEvent>,
) {
    loop {
        tokio::select! {
            event = channel_events.recv() => match event {
                Some(ChannelEvent::Message(message)) => {
                    handle_channel_message(&mut ctx, message).await;
                }
                Some(ChannelEvent::Protocol(error)) => {
                    ctx.callback.on_notice(error);
                }
                Some(ChannelEvent::Closed) | None => {
                    info!("Signaling channel closed, ending session");
                    ctx.callback.on_disconnected();
                    break;
                }
            },

            intent = intents.recv() => match intent {
                Some(intent) => {
                    let effects = handle_intent(&mut ctx.state, intent);
                    apply_effects(&mut ctx, effects);
                }
                None => {
                    info!("Session handle dropped, leaving room");
                    break;
                }
            },

            Some(message) = peer_signals.recv() => {
                if let Err(e) = ctx.channel.send(message) {
                    warn!("Failed to relay peer signal: {}", e);
                }
            }

            Some(event) = peer_events.recv() => match event {
                PeerEvent::StateChanged { peer_id, state } => {
                    ctx.peers.apply_state_change(&peer_id, state).await;
                }
                PeerEvent::RemoteTrack { peer_id } => {
                    ctx.callback.on_remote_track(peer_id);
                }
                PeerEvent::NegotiationTimeout { peer_id } => {
                    ctx.peers.fail_negotiation(&peer_id).await;
                }
            },
        }
    }

    ctx.peers.shutdown().await;
}

async fn handle_channel_message(ctx: &mut RunContext, message: WireMessage) {
    match message {
        WireMessage::NewPeer { peer_id } => {
            if !ctx.state.role.is_host() {
                debug!("Ignoring new-peer notification while not hosting");
                return;
            }
            match ctx.peers.connect_listener_peer(peer_id.clone()).await {
                Ok(()) => {}
                Err(PeerError::Capture(e)) => {
                    // Media broadcast is unavailable; control-plane sync
                    // continues without audio.
                    warn!("Cannot capture playback for streaming: {}", e);
                    ctx.callback.on_notice(e.to_string());
                }
                Err(e) => warn!("Failed to open media connection to {}: {}", peer_id, e),
            }
        }

        WireMessage::Signal {
            from_id: Some(from),
            payload,
            ..
        } => handle_signal(ctx, from, payload).await,

        WireMessage::Signal { from_id: None, .. } => {
            warn!("Dropping peer signal without sender id");
        }

        other => {
            let effects = handle_message(&mut ctx.state, other);
            apply_effects(ctx, effects);
        }
    }
}

async fn handle_signal(ctx: &mut RunContext, from: String, payload: SignalPayload) {
    let result = match (ctx.state.role, payload) {
        (ClientRole::Host, SignalPayload::Answer { sdp }) => {
            ctx.peers.accept_answer(&from, sdp).await
        }
        (ClientRole::Host, SignalPayload::Ice { candidate }) => {
            ctx.peers.accept_host_candidate(&from, candidate).await
        }
        (ClientRole::Listener, SignalPayload::Offer { sdp }) => {
            ctx.peers.accept_offer(&from, sdp).await
        }
        (ClientRole::Listener, SignalPayload::Ice { candidate }) => {
            ctx.peers.accept_listener_candidate(&from, candidate).await
        }
        (role, _) => {
            warn!("Ignoring peer signal from {} not applicable in role {:?}", from, role);
            Ok(())
        }
    };

    if let Err(e) = result {
        // Negotiation failures degrade that peer's audio only; playback
        // control messages keep flowing.
        warn!("Peer negotiation with {} failed: {}", from, e);
    }
}

fn apply_effects(ctx: &mut RunContext, effects: Effects) {
    let Effects {
        outbound,
        player,
        render,
        notices,
    } = effects;

    for message in outbound {
        if let Err(e) = ctx.channel.send(message) {
            warn!("Failed to send to relay: {}", e);
        }
    }

    for command in player {
        match command {
            PlayerCommand::Resync => {
                // Pause now, resume shortly after so the media transport
                // catches up with the host's new position.
                ctx.callback.on_player(PlayerCommand::Pause);
                let callback = Arc::clone(&ctx.callback);
                tokio::spawn(async move {
                    tokio::time::sleep(RESYNC_DELAY).await;
                    callback.on_player(PlayerCommand::Play);
                });
            }
            other => ctx.callback.on_player(other),
        }
    }

    for notice in notices {
        ctx.callback.on_notice(notice);
    }

    if render {
        ctx.callback
            .on_state_changed(ctx.state.playback.snapshot(), ctx.state.role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{MediaHandle, NewFile};
    use futures::{SinkExt, StreamExt};
    use std::sync::Mutex;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

    #[derive(Default)]
    struct RecordingCallback {
        snapshots: Mutex<Vec<(StateSnapshot, ClientRole)>>,
        notices: Mutex<Vec<String>>,
    }

    impl SessionCallback for RecordingCallback {
        fn on_state_changed(&self, snapshot: StateSnapshot, role: ClientRole) {
            self.snapshots.lock().unwrap().push((snapshot, role));
        }
        fn on_player(&self, _command: PlayerCommand) {}
        fn on_notice(&self, message: String) {
            self.notices.lock().unwrap().push(message);
        }
        fn on_remote_track(&self, _peer_id: String) {}
        fn on_disconnected(&self) {}
    }

    async fn send(socket: &mut WebSocketStream<TcpStream>, message: WireMessage) {
        let text = serde_json::to_string(&message).unwrap();
        socket.send(Message::Text(text)).await.unwrap();
    }

    async fn recv(socket: &mut WebSocketStream<TcpStream>) -> WireMessage {
        loop {
            match socket.next().await.unwrap().unwrap() {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                _ => continue,
            }
        }
    }

    fn test_config(addr: std::net::SocketAddr) -> SessionConfig {
        SessionConfig {
            relay_url: format!("ws://{}", addr),
            ice_servers: Vec::new(),
            negotiation_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_host_session_broadcasts_and_answers_sync_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let relay = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(tcp).await.unwrap();

            send(
                &mut socket,
                WireMessage::Hello {
                    client_id: "host-1".to_string(),
                },
            )
            .await;

            match recv(&mut socket).await {
                WireMessage::RoomCreate { room_id } => assert_eq!(room_id, "PARTY"),
                other => panic!("expected room:create, got {:?}", other),
            }
            send(&mut socket, WireMessage::RoomCreated).await;

            // Host adds a file; a playlist update must follow.
            match recv(&mut socket).await {
                WireMessage::PlaylistUpdate { playlist } => {
                    assert_eq!(playlist.len(), 1);
                    assert_eq!(playlist[0].title, "song");
                }
                other => panic!("expected playlist:update, got {:?}", other),
            }

            // A listener asks for a snapshot through the relay.
            send(
                &mut socket,
                WireMessage::SyncRequest {
                    target_id: "listener-1".to_string(),
                },
            )
            .await;
            match recv(&mut socket).await {
                WireMessage::SyncState { target_id, state } => {
                    assert_eq!(target_id.as_deref(), Some("listener-1"));
                    assert_eq!(state.playlist.len(), 1);
                    assert_eq!(state.current, -1);
                }
                other => panic!("expected sync:state, got {:?}", other),
            }

            socket.close(None).await.unwrap();
        });

        let callback = Arc::new(RecordingCallback::default());
        let session = Session::connect(
            test_config(addr),
            RoomId::parse("party").unwrap(),
            JoinMode::Create,
            Arc::new(MediaSource::opus()),
            Arc::clone(&callback) as Arc<dyn SessionCallback>,
        )
        .await
        .unwrap();

        // Wait until the room handshake made us host before adding files.
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if callback
                    .snapshots
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|(_, role)| role.is_host())
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("never became host");

        session.submit(LocalIntent::AddFiles(vec![NewFile {
            filename: "song.mp3".to_string(),
            tag_title: None,
            media: MediaHandle::new("/music/song.mp3"),
        }]));

        relay.await.unwrap();
        session.leave().await;
    }

    #[tokio::test]
    async fn test_listener_requests_sync_after_join() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let relay = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(tcp).await.unwrap();

            send(
                &mut socket,
                WireMessage::Hello {
                    client_id: "listener-7".to_string(),
                },
            )
            .await;

            match recv(&mut socket).await {
                WireMessage::RoomJoin { room_id } => assert_eq!(room_id, "PARTY"),
                other => panic!("expected room:join, got {:?}", other),
            }
            send(&mut socket, WireMessage::RoomJoined { host: false }).await;

            // The late joiner must immediately ask for a snapshot of itself.
            match recv(&mut socket).await {
                WireMessage::SyncRequest { target_id } => assert_eq!(target_id, "listener-7"),
                other => panic!("expected sync:request, got {:?}", other),
            }

            socket.close(None).await.unwrap();
        });

        let callback = Arc::new(RecordingCallback::default());
        let session = Session::connect(
            test_config(addr),
            RoomId::parse("party").unwrap(),
            JoinMode::Join,
            Arc::new(MediaSource::opus()),
            callback as Arc<dyn SessionCallback>,
        )
        .await
        .unwrap();

        relay.await.unwrap();
        session.leave().await;
    }
}
