//! Peer Negotiation Manager
//!
//! One outbound media connection per listener on the host, at most one
//! inbound connection on a listener. Offers, answers and ICE candidates are
//! relayed through the signaling channel addressed by peer id. Peer sessions
//! are independent: one failing never affects the others or host playback.

mod media;

pub use media::{CaptureFn, MediaCaptureError, MediaSource};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::TrackLocal;

use crate::sync::{SignalPayload, WireMessage};

/// Peer negotiation errors
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("webrtc failure: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error(transparent)]
    Capture(#[from] MediaCaptureError),

    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("signaling channel closed")]
    SignalingClosed,
}

/// Lifecycle of one peer media connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    Negotiating,
    Connected,
    Failed,
    Closed,
}

impl PeerConnectionState {
    /// Map the transport's connection state onto ours. `None` means the
    /// transition is internal to negotiation and does not change our state.
    fn from_rtc(state: RTCPeerConnectionState) -> Option<Self> {
        match state {
            RTCPeerConnectionState::Connected => Some(PeerConnectionState::Connected),
            RTCPeerConnectionState::Failed | RTCPeerConnectionState::Disconnected => {
                Some(PeerConnectionState::Failed)
            }
            RTCPeerConnectionState::Closed => Some(PeerConnectionState::Closed),
            _ => None,
        }
    }
}

/// Events the manager reports back to the session loop
#[derive(Debug)]
pub enum PeerEvent {
    /// Transport-level connection state changed for one peer
    StateChanged {
        peer_id: String,
        state: RTCPeerConnectionState,
    },
    /// Listener side: the host's stream started arriving
    RemoteTrack { peer_id: String },
    /// A peer stayed in negotiation past the configured timeout
    NegotiationTimeout { peer_id: String },
}

/// One peer media connection and its lifecycle state
struct PeerSession {
    state: PeerConnectionState,
    connection: Arc<RTCPeerConnection>,
    watchdog: Option<JoinHandle<()>>,
}

impl PeerSession {
    async fn close(mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
        if let Err(e) = self.connection.close().await {
            debug!("Error closing peer connection: {}", e);
        }
    }
}

fn build_api() -> Result<API, webrtc::Error> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let mut registry = Registry::new();
    registry = register_default_interceptors(registry, &mut media_engine)?;
    Ok(APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build())
}

/// Manages peer media connections for one room session
pub struct PeerManager {
    api: API,
    rtc_config: RTCConfiguration,
    media: Arc<MediaSource>,
    signal_tx: mpsc::UnboundedSender<WireMessage>,
    event_tx: mpsc::UnboundedSender<PeerEvent>,
    negotiation_timeout: Duration,
    /// Host side: one session per listener
    outbound: HashMap<String, PeerSession>,
    /// Listener side: the single host connection
    inbound: Option<(String, PeerSession)>,
}

impl PeerManager {
    pub fn new(
        ice_servers: Vec<String>,
        negotiation_timeout: Duration,
        media: Arc<MediaSource>,
        signal_tx: mpsc::UnboundedSender<WireMessage>,
        event_tx: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Self, PeerError> {
        let api = build_api()?;
        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: ice_servers,
                ..Default::default()
            }],
            ..Default::default()
        };

        Ok(Self {
            api,
            rtc_config,
            media,
            signal_tx,
            event_tx,
            negotiation_timeout,
            outbound: HashMap::new(),
            inbound: None,
        })
    }

    /// Host: open an outbound connection to a newly announced listener and
    /// send it an offer. The captured media source is shared by all peers.
    pub async fn connect_listener_peer(&mut self, peer_id: String) -> Result<(), PeerError> {
        // A reconnecting listener gets a fresh session.
        if let Some(stale) = self.outbound.remove(&peer_id) {
            info!("Replacing stale peer session for {}", peer_id);
            stale.close().await;
        }

        let track = self.media.acquire()?;

        let connection = Arc::new(self.api.new_peer_connection(self.rtc_config.clone()).await?);
        connection
            .add_transceiver_from_track(
                Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendonly,
                    send_encodings: Vec::new(),
                }),
            )
            .await?;

        self.wire_ice_relay(&connection, &peer_id);
        self.wire_connection_state(&connection, &peer_id);

        let offer = connection.create_offer(None).await?;
        connection.set_local_description(offer.clone()).await?;
        self.send_signal(&peer_id, SignalPayload::Offer { sdp: offer })?;

        let watchdog = self.spawn_watchdog(peer_id.clone());
        self.outbound.insert(
            peer_id.clone(),
            PeerSession {
                state: PeerConnectionState::Negotiating,
                connection,
                watchdog: Some(watchdog),
            },
        );

        info!("Negotiating media connection with listener {}", peer_id);
        Ok(())
    }

    /// Host: complete negotiation with the listener that answered
    pub async fn accept_answer(
        &mut self,
        from_id: &str,
        sdp: RTCSessionDescription,
    ) -> Result<(), PeerError> {
        let session = self
            .outbound
            .get(from_id)
            .ok_or_else(|| PeerError::UnknownPeer(from_id.to_string()))?;
        session.connection.set_remote_description(sdp).await?;
        debug!("Applied answer from {}", from_id);
        Ok(())
    }

    /// Host: apply a listener's trickled ICE candidate
    pub async fn accept_host_candidate(
        &mut self,
        from_id: &str,
        candidate: RTCIceCandidateInit,
    ) -> Result<(), PeerError> {
        let session = self
            .outbound
            .get(from_id)
            .ok_or_else(|| PeerError::UnknownPeer(from_id.to_string()))?;
        session.connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    /// Listener: handle the host's offer, producing an answer back to it
    pub async fn accept_offer(
        &mut self,
        from_id: &str,
        sdp: RTCSessionDescription,
    ) -> Result<(), PeerError> {
        let connection = self.ensure_inbound(from_id).await?;
        connection.set_remote_description(sdp).await?;
        let answer = connection.create_answer(None).await?;
        connection.set_local_description(answer.clone()).await?;
        self.send_signal(from_id, SignalPayload::Answer { sdp: answer })?;
        info!("Answered media offer from host {}", from_id);
        Ok(())
    }

    /// Listener: apply an ICE candidate from the host. Creates the inbound
    /// connection if the candidate raced ahead of the offer.
    pub async fn accept_listener_candidate(
        &mut self,
        from_id: &str,
        candidate: RTCIceCandidateInit,
    ) -> Result<(), PeerError> {
        let connection = self.ensure_inbound(from_id).await?;
        connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    /// React to a transport connection-state change reported via `PeerEvent`
    pub async fn apply_state_change(&mut self, peer_id: &str, rtc_state: RTCPeerConnectionState) {
        let Some(next) = PeerConnectionState::from_rtc(rtc_state) else {
            return;
        };

        match next {
            PeerConnectionState::Connected => {
                if let Some(session) = self.session_mut(peer_id) {
                    session.state = PeerConnectionState::Connected;
                    if let Some(watchdog) = session.watchdog.take() {
                        watchdog.abort();
                    }
                    info!("Media connection with {} established", peer_id);
                }
            }
            PeerConnectionState::Failed | PeerConnectionState::Closed => {
                // Degraded, not fatal: control messages keep the UI in sync
                // even without audio. No automatic retry.
                warn!("Media connection with {} is {:?}", peer_id, next);
                self.drop_session(peer_id).await;
            }
            PeerConnectionState::Negotiating => {}
        }
    }

    /// Tear down a peer that never finished negotiating
    pub async fn fail_negotiation(&mut self, peer_id: &str) {
        let still_negotiating = self
            .session_state(peer_id)
            .map(|s| s == PeerConnectionState::Negotiating)
            .unwrap_or(false);
        if still_negotiating {
            warn!("Negotiation with {} timed out, tearing down", peer_id);
            self.drop_session(peer_id).await;
        }
    }

    /// Close every peer connection (room teardown)
    pub async fn shutdown(&mut self) {
        for (_, session) in self.outbound.drain() {
            session.close().await;
        }
        if let Some((_, session)) = self.inbound.take() {
            session.close().await;
        }
    }

    /// Number of host-side peer sessions currently alive
    pub fn outbound_peers(&self) -> usize {
        self.outbound.len()
    }

    /// State of the session for `peer_id`, if one exists
    pub fn session_state(&self, peer_id: &str) -> Option<PeerConnectionState> {
        match &self.inbound {
            Some((id, session)) if id == peer_id => Some(session.state),
            _ => self.outbound.get(peer_id).map(|s| s.state),
        }
    }

    async fn ensure_inbound(&mut self, peer_id: &str) -> Result<Arc<RTCPeerConnection>, PeerError> {
        if let Some((_, session)) = &self.inbound {
            return Ok(Arc::clone(&session.connection));
        }

        let connection = Arc::new(self.api.new_peer_connection(self.rtc_config.clone()).await?);

        let event_tx = self.event_tx.clone();
        let track_peer = peer_id.to_string();
        connection.on_track(Box::new(move |_track, _receiver, _transceiver| {
            let event_tx = event_tx.clone();
            let peer_id = track_peer.clone();
            Box::pin(async move {
                let _ = event_tx.send(PeerEvent::RemoteTrack { peer_id });
            })
        }));
        self.wire_connection_state(&connection, peer_id);

        self.inbound = Some((
            peer_id.to_string(),
            PeerSession {
                state: PeerConnectionState::Negotiating,
                connection: Arc::clone(&connection),
                watchdog: None,
            },
        ));
        Ok(connection)
    }

    fn session_mut(&mut self, peer_id: &str) -> Option<&mut PeerSession> {
        match &mut self.inbound {
            Some((id, session)) if id == peer_id => Some(session),
            _ => self.outbound.get_mut(peer_id),
        }
    }

    async fn drop_session(&mut self, peer_id: &str) {
        if let Some(session) = self.outbound.remove(peer_id) {
            session.close().await;
        } else if matches!(&self.inbound, Some((id, _)) if id == peer_id) {
            if let Some((_, session)) = self.inbound.take() {
                session.close().await;
            }
        }
    }

    fn send_signal(&self, target_id: &str, payload: SignalPayload) -> Result<(), PeerError> {
        self.signal_tx
            .send(WireMessage::Signal {
                target_id: Some(target_id.to_string()),
                from_id: None,
                payload,
            })
            .map_err(|_| PeerError::SignalingClosed)
    }

    fn wire_ice_relay(&self, connection: &Arc<RTCPeerConnection>, peer_id: &str) {
        let signal_tx = self.signal_tx.clone();
        let peer_id = peer_id.to_string();
        connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let signal_tx = signal_tx.clone();
            let peer_id = peer_id.clone();
            Box::pin(async move {
                if let Some(candidate) = candidate {
                    match candidate.to_json() {
                        Ok(init) => {
                            let _ = signal_tx.send(WireMessage::Signal {
                                target_id: Some(peer_id),
                                from_id: None,
                                payload: SignalPayload::Ice { candidate: init },
                            });
                        }
                        Err(e) => warn!("Failed to serialize ICE candidate: {}", e),
                    }
                }
            })
        }));
    }

    fn wire_connection_state(&self, connection: &Arc<RTCPeerConnection>, peer_id: &str) {
        let event_tx = self.event_tx.clone();
        let peer_id = peer_id.to_string();
        connection.on_peer_connection_state_change(Box::new(move |state| {
            let event_tx = event_tx.clone();
            let peer_id = peer_id.clone();
            Box::pin(async move {
                let _ = event_tx.send(PeerEvent::StateChanged { peer_id, state });
            })
        }));
    }

    fn spawn_watchdog(&self, peer_id: String) -> JoinHandle<()> {
        let event_tx = self.event_tx.clone();
        let timeout = self.negotiation_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = event_tx.send(PeerEvent::NegotiationTimeout { peer_id });
        })
    }
}
