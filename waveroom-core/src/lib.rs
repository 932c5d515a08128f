//! Waveroom - Core Library
//!
//! This library provides the room coordination core for streaming locally
//! loaded audio files from one host to a group of listeners, keeping
//! playlist, playback position and playback modifiers in sync.

pub mod network;
pub mod peer;
pub mod session;
pub mod sync;

// Re-exports for convenience
pub use network::{ChannelEvent, ChannelHandle, RoomId, SignalingError};
pub use peer::{MediaCaptureError, MediaSource, PeerConnectionState, PeerError, PeerManager};
pub use session::{CoreError, JoinMode, Session, SessionCallback, SessionConfig};
pub use sync::{
    ClientRole, Effects, LocalIntent, PlaybackState, PlayerCommand, SessionState, WireMessage,
};
