//! Relay Networking
//!
//! WebSocket signaling channel to the relay server plus room id handling.

mod channel;
mod room_id;

pub use channel::{ChannelEvent, ChannelHandle, SignalingChannel, SignalingError};
pub use room_id::RoomId;
