//! Registry of live sessions, one per owner.

use std::sync::Arc;

use chorus_core::Downloaders;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use crate::manager::QueueManager;
use crate::session::{spawn_session, SessionConfig, SessionHandle};
use crate::status::StatusSink;
use crate::transport::{OwnerId, Transport};

/// Maps each owner to its session, creating sessions on first use.
pub struct SessionRegistry {
    sessions: DashMap<OwnerId, SessionHandle>,
    downloaders: Downloaders,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(downloaders: Downloaders, config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            downloaders,
            config,
        }
    }

    /// Session for the transport's owner. A new one is spawned when none
    /// exists or the previous one has ended.
    pub fn get_or_create(&self, transport: Arc<dyn Transport>, status: Arc<dyn StatusSink>) -> SessionHandle {
        let owner = transport.owner_id();
        match self.sessions.entry(owner) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_closed() {
                    info!(owner = %entry.key(), "Replacing ended session");
                    entry.insert(self.spawn(transport, status));
                }
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                info!(owner = %entry.key(), "Creating session");
                entry.insert(self.spawn(transport, status)).clone()
            }
        }
    }

    fn spawn(&self, transport: Arc<dyn Transport>, status: Arc<dyn StatusSink>) -> SessionHandle {
        let manager = QueueManager::new(transport, status, self.downloaders.clone());
        spawn_session(manager, &self.config)
    }

    /// Live session for `owner`, if any.
    pub fn get(&self, owner: &OwnerId) -> Option<SessionHandle> {
        self.sessions
            .get(owner)
            .filter(|handle| !handle.is_closed())
            .map(|handle| handle.clone())
    }

    /// Drop the owner's session and ask it to shut down.
    pub fn evict(&self, owner: &OwnerId) -> bool {
        match self.sessions.remove(owner) {
            Some((_, handle)) => {
                handle.request_shutdown();
                info!(%owner, "Session evicted");
                true
            }
            None => false,
        }
    }

    /// Evict every session whose owner matches `predicate`. Returns the count.
    pub fn evict_where(&self, mut predicate: impl FnMut(&OwnerId) -> bool) -> usize {
        let owners: Vec<OwnerId> = self
            .sessions
            .iter()
            .filter(|entry| predicate(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        owners.iter().filter(|owner| self.evict(owner)).count()
    }

    pub fn owners(&self) -> Vec<OwnerId> {
        let mut owners: Vec<OwnerId> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        owners.sort();
        owners
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MockDownloader, MockTransport, RecordingSink};
    use chorus_core::{Error, Video};

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Downloaders::new().with(Arc::new(MockDownloader::default())),
            SessionConfig::default(),
        )
    }

    fn session(registry: &SessionRegistry, owner: &str) -> SessionHandle {
        registry.get_or_create(
            Arc::new(MockTransport::connected(owner)),
            Arc::new(RecordingSink::default()),
        )
    }

    fn video(title: &str) -> Video {
        Video::new(format!("https://youtu.be/{title}"), title)
    }

    #[tokio::test]
    async fn test_same_owner_shares_session() {
        let registry = registry();
        let first = session(&registry, "guild-1");
        first.add_item(video("A").into(), None).await.unwrap();

        let second = session(&registry, "guild-1");
        assert_eq!(second.snapshot().await.unwrap().entries.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_owners_are_isolated() {
        let registry = registry();
        let one = session(&registry, "guild-1");
        let two = session(&registry, "guild-2");
        one.add_item(video("A").into(), None).await.unwrap();

        assert!(two.snapshot().await.unwrap().entries.is_empty());
        assert_eq!(registry.owners(), [OwnerId::from("guild-1"), OwnerId::from("guild-2")]);
    }

    #[tokio::test]
    async fn test_evict_then_recreate_starts_fresh() {
        let registry = registry();
        let old = session(&registry, "guild-1");
        old.add_item(video("A").into(), None).await.unwrap();

        assert!(registry.evict(&OwnerId::from("guild-1")));
        assert!(!registry.evict(&OwnerId::from("guild-1")));
        assert!(registry.get(&OwnerId::from("guild-1")).is_none());
        assert!(matches!(old.snapshot().await, Err(Error::SessionClosed)));

        let fresh = session(&registry, "guild-1");
        assert!(fresh.snapshot().await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_closed_session_is_replaced() {
        let registry = registry();
        let old = session(&registry, "guild-1");
        old.shutdown().await;
        assert!(matches!(old.snapshot().await, Err(Error::SessionClosed)));
        assert!(registry.get(&OwnerId::from("guild-1")).is_none());

        let fresh = session(&registry, "guild-1");
        assert!(!fresh.is_closed());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_evict_where_matches_predicate() {
        let registry = registry();
        for owner in ["guild-1", "guild-2", "dm-1"] {
            session(&registry, owner);
        }

        let evicted = registry.evict_where(|owner| owner.as_str().starts_with("guild"));
        assert_eq!(evicted, 2);
        assert_eq!(registry.owners(), [OwnerId::from("dm-1")]);
    }
}
