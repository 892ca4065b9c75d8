//! Streaming transport interface.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chorus_core::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Identity of the entity a session is bound to (e.g. a voice channel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for OwnerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for OwnerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Events emitted by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection went away.
    Disconnect,
    /// The current file played to its end without being stopped.
    PlaybackFinished,
}

/// Owns the streaming connection for one session owner.
///
/// Suppressing `PlaybackFinished` after an explicit [`Transport::stop`] is the
/// transport's job; the queue manager additionally ignores it while idle.
#[async_trait]
pub trait Transport: Send + Sync {
    fn owner_id(&self) -> OwnerId;

    async fn connect(&self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Start streaming a local file, replacing whatever is playing.
    async fn play(&self, path: &Path) -> Result<()>;

    /// Halt playback. Calling it while nothing plays is not an error.
    async fn stop(&self) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}
