//! Room Synchronization
//!
//! Wire protocol, playback state store and the role-gated command router.

mod protocol;
mod router;
mod state;

pub use protocol::*;
pub use router::*;
pub use state::*;
