//! Outward status notifications.
//!
//! A play cycle owns at most one live notification. The first update in a
//! cycle creates it, later updates edit it, and starting the next cycle
//! forgets the handle so a fresh notification is created.

use std::sync::Arc;

use async_trait::async_trait;
use chorus_core::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to a notification previously sent through a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusHandle(pub String);

impl StatusHandle {
    /// Fresh random handle, for sinks that mint their own ids.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Where status text goes (a chat channel, a terminal, ...).
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<StatusHandle>;

    async fn edit(&self, handle: &StatusHandle, text: &str) -> Result<()>;
}

/// Applies the create-then-edit discipline on top of a [`StatusSink`].
pub struct StatusNotifier {
    sink: Arc<dyn StatusSink>,
    live: Option<StatusHandle>,
}

impl StatusNotifier {
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self { sink, live: None }
    }

    /// Forget the current notification; the next update creates a new one.
    pub fn begin_cycle(&mut self) {
        self.live = None;
    }

    pub const fn live_handle(&self) -> Option<&StatusHandle> {
        self.live.as_ref()
    }

    /// Create the cycle's notification, or edit it if it already exists.
    pub async fn update(&mut self, text: &str) -> Result<()> {
        if self.live.is_some() {
            self.edit(text).await
        } else {
            self.create(text).await
        }
    }

    async fn create(&mut self, text: &str) -> Result<()> {
        let handle = self.sink.send(text).await?;
        self.live = Some(handle);
        Ok(())
    }

    /// Edit the live notification. Fails if the cycle has none yet.
    pub async fn edit(&mut self, text: &str) -> Result<()> {
        let handle = self
            .live
            .as_ref()
            .ok_or_else(|| Error::Internal("status edit without a live notification".to_string()))?;
        self.sink.edit(handle, text).await
    }

    /// Standalone message outside the play cycle.
    pub async fn announce(&self, text: &str) -> Result<()> {
        self.sink.send(text).await.map(|_| ())
    }
}
