//! # chorus-player
//!
//! Per-session playback queue orchestration for Chorus.
//!
//! Features:
//! - Two-level queue cursor over videos, playlists and local sounds
//! - Download-before-play with memoized local paths
//! - One serialized session task per owner, fed by commands and transport events
//! - Create-then-edit status notifications per play cycle

pub mod manager;
pub mod registry;
pub mod session;
pub mod status;
pub mod transport;

#[cfg(test)]
mod testing;

pub use manager::{PlaybackState, QueueManager, QueueSnapshot, SnapshotEntry};
pub use registry::SessionRegistry;
pub use session::{spawn_session, SessionConfig, SessionHandle};
pub use status::{StatusHandle, StatusNotifier, StatusSink};
pub use transport::{OwnerId, Transport, TransportEvent};
