//! Wire Protocol Messages
//!
//! Every frame exchanged with the relay is one JSON object with a `type`
//! discriminator. Clients and relay share this catalogue; the relay only ever
//! looks at `type`, `roomId` and `targetId` and forwards the rest opaquely.

use serde::{Deserialize, Serialize};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Playlist entry as listeners see it: no media handle, just display data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    /// Display title, unique within a playlist
    pub title: String,
    /// Original file name, not necessarily unique
    pub filename: String,
}

/// Playback modifier flags
///
/// `loop_queue` and `loop_song` are mutually exclusive; the router clears one
/// when the other is toggled on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackFlags {
    #[serde(rename = "loopQueue")]
    pub loop_queue: bool,
    #[serde(rename = "loopSong")]
    pub loop_song: bool,
    pub shuffle: bool,
}

/// Full playback snapshot, sent to reconcile a late joiner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub playlist: Vec<TrackSummary>,
    /// Active index, `-1` when nothing is selected
    pub current: i64,
    pub flags: PlaybackFlags,
    pub volume: f64,
    pub playing: bool,
}

/// Play/pause command payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayPause {
    Play,
    Pause,
}

/// Body of a relay-routed peer negotiation message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SignalPayload {
    /// Host's connection offer for one listener
    Offer { sdp: RTCSessionDescription },
    /// Listener's answer back to the host
    Answer { sdp: RTCSessionDescription },
    /// Trickled ICE candidate
    Ice { candidate: RTCIceCandidateInit },
}

/// Messages exchanged over the signaling channel
///
/// One closed catalogue for both directions; each handler checks the local
/// role before acting, so a message arriving at the "wrong" end is ignored
/// rather than misapplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    // === Connection lifecycle (relay -> client) ===
    /// Sent once on connect with the relay-assigned client id
    #[serde(rename = "hello")]
    Hello {
        #[serde(rename = "clientId")]
        client_id: String,
    },

    /// Relay-reported error, surfaced to the user
    #[serde(rename = "error")]
    Error { message: String },

    // === Room management ===
    /// Request to create a room (client -> relay)
    #[serde(rename = "room:create")]
    RoomCreate {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// Request to join an existing room (client -> relay)
    #[serde(rename = "room:join")]
    RoomJoin {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// Room created, sender is now the host (relay -> client)
    #[serde(rename = "room:created")]
    RoomCreated,

    /// Join completed; `host` tells the client which role it got
    #[serde(rename = "room:joined")]
    RoomJoined { host: bool },

    // === Peer negotiation ===
    /// A new listener arrived; the host should open a media connection to it
    #[serde(rename = "webrtc:new-peer")]
    NewPeer {
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// Offer/answer/ICE, routed by the relay to `target_id`.
    /// The relay stamps `from_id` with the sender before forwarding.
    #[serde(rename = "webrtc:signal")]
    Signal {
        #[serde(rename = "targetId", default, skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
        #[serde(rename = "fromId", default, skip_serializing_if = "Option::is_none")]
        from_id: Option<String>,
        payload: SignalPayload,
    },

    // === Playback control (host -> all listeners) ===
    /// Active track changed
    #[serde(rename = "control:track")]
    ControlTrack { index: i64 },

    /// Playback started or paused
    #[serde(rename = "control:playpause")]
    ControlPlayPause { state: PlayPause },

    /// Host seeked; listeners resynchronize their media transport
    #[serde(rename = "control:seek")]
    ControlSeek { time: f64 },

    /// Host volume changed
    #[serde(rename = "control:volume")]
    ControlVolume { volume: f64 },

    /// Modifier flags changed
    #[serde(rename = "control:flags")]
    ControlFlags { flags: PlaybackFlags },

    /// Full playlist replacement after add/remove/reorder
    #[serde(rename = "playlist:update")]
    PlaylistUpdate { playlist: Vec<TrackSummary> },

    // === Late-join reconciliation ===
    /// Listener asks the host for a snapshot, naming itself as target
    #[serde(rename = "sync:request")]
    SyncRequest {
        #[serde(rename = "targetId")]
        target_id: String,
    },

    /// Host's authoritative snapshot, routed to `target_id`
    #[serde(rename = "sync:state")]
    SyncState {
        #[serde(rename = "targetId", default, skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
        state: StateSnapshot,
    },
}
