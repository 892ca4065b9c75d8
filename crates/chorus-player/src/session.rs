//! Session actor.
//!
//! Each session runs its [`QueueManager`] on one task that drains a single
//! command channel. Transport events are forwarded into the same channel, so
//! user commands and events are handled strictly one at a time, in arrival
//! order. An explicit stop therefore always wins over a finished event that
//! arrives after it.

use chorus_core::{Error, PlayableItem, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::manager::{QueueManager, QueueSnapshot};
use crate::transport::{OwnerId, TransportEvent};

/// Session tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bound of the per-session command channel.
    pub command_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    Connect(Reply<()>),
    Play { index: Option<usize>, reply: Reply<()> },
    Next(Reply<()>),
    Previous(Reply<()>),
    Stop(Reply<()>),
    Clear(Reply<()>),
    Add { item: PlayableItem, index: Option<usize>, reply: Reply<usize> },
    Remove { index: usize, reply: Reply<PlayableItem> },
    Swap { a: usize, b: usize, reply: Reply<()> },
    Shuffle { exclude_playlists: bool, reply: Reply<()> },
    Snapshot(oneshot::Sender<QueueSnapshot>),
    Event(TransportEvent),
    Shutdown,
}

/// Cheap, cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    owner: OwnerId,
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// True once the session task has ended.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    pub async fn connect(&self) -> Result<()> {
        self.request(Command::Connect).await
    }

    pub async fn play(&self, index: Option<usize>) -> Result<()> {
        self.request(|reply| Command::Play { index, reply }).await
    }

    pub async fn next(&self) -> Result<()> {
        self.request(Command::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.request(Command::Previous).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(Command::Stop).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.request(Command::Clear).await
    }

    pub async fn add_item(&self, item: PlayableItem, index: Option<usize>) -> Result<usize> {
        self.request(|reply| Command::Add { item, index, reply }).await
    }

    pub async fn remove_item(&self, index: usize) -> Result<PlayableItem> {
        self.request(|reply| Command::Remove { index, reply }).await
    }

    pub async fn swap(&self, a: usize, b: usize) -> Result<()> {
        self.request(|reply| Command::Swap { a, b, reply }).await
    }

    pub async fn shuffle(&self, exclude_playlists: bool) -> Result<()> {
        self.request(|reply| Command::Shuffle {
            exclude_playlists,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Ask the session task to finish. Queued commands ahead of it still run.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }

    /// Non-blocking variant of [`SessionHandle::shutdown`].
    pub(crate) fn request_shutdown(&self) {
        if let Err(e) = self.tx.try_send(Command::Shutdown) {
            debug!(owner = %self.owner, "Shutdown not queued: {e}");
        }
    }
}

/// Start the session task for `manager`. Must be called within a tokio runtime.
pub fn spawn_session(manager: QueueManager, config: &SessionConfig) -> SessionHandle {
    let owner = manager.owner().clone();
    let (tx, rx) = mpsc::channel(config.command_capacity.max(1));

    let events = manager.transport().subscribe();
    tokio::spawn(forward_events(owner.clone(), events, tx.downgrade()));
    tokio::spawn(run(manager, rx));

    SessionHandle { owner, tx }
}

/// Feed transport events into the session's command channel.
///
/// Holds only a weak sender so the session ends once every handle is gone.
async fn forward_events(
    owner: OwnerId,
    mut events: broadcast::Receiver<TransportEvent>,
    tx: mpsc::WeakSender<Command>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(%owner, skipped, "Transport events lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let Some(tx) = tx.upgrade() else { break };
        if tx.send(Command::Event(event)).await.is_err() {
            break;
        }
    }
    debug!(%owner, "Transport event forwarding ended");
}

async fn run(mut manager: QueueManager, mut rx: mpsc::Receiver<Command>) {
    let owner = manager.owner().clone();
    info!(%owner, "Session started");

    while let Some(command) = rx.recv().await {
        match command {
            Command::Connect(reply) => {
                let _ = reply.send(manager.connect().await);
            }
            Command::Play { index, reply } => {
                let _ = reply.send(manager.play(index).await);
            }
            Command::Next(reply) => {
                let _ = reply.send(manager.next().await);
            }
            Command::Previous(reply) => {
                let _ = reply.send(manager.previous().await);
            }
            Command::Stop(reply) => {
                let _ = reply.send(manager.stop().await);
            }
            Command::Clear(reply) => {
                let _ = reply.send(manager.clear().await);
            }
            Command::Add { item, index, reply } => {
                let _ = reply.send(manager.add_item(item, index).await);
            }
            Command::Remove { index, reply } => {
                let _ = reply.send(manager.remove_item(index).await);
            }
            Command::Swap { a, b, reply } => {
                let _ = reply.send(manager.swap(a, b).await);
            }
            Command::Shuffle {
                exclude_playlists,
                reply,
            } => {
                let _ = reply.send(manager.shuffle(exclude_playlists).await);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(manager.snapshot());
            }
            Command::Event(event) => {
                if let Err(e) = manager.handle_event(event).await {
                    error!(%owner, ?event, "Transport event handling failed: {e}");
                }
            }
            Command::Shutdown => break,
        }
    }

    info!(%owner, "Session ended");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manager::PlaybackState;
    use crate::testing::{MockDownloader, MockTransport, RecordingSink};
    use chorus_core::{Cursor, Downloaders, Duration, Video};
    use std::sync::Arc;

    fn start(transport: &Arc<MockTransport>) -> SessionHandle {
        let manager = QueueManager::new(
            transport.clone(),
            Arc::new(RecordingSink::default()),
            Downloaders::new().with(Arc::new(MockDownloader::default())),
        );
        spawn_session(manager, &SessionConfig::default())
    }

    fn video(title: &str) -> PlayableItem {
        Video::new(format!("https://youtu.be/{title}"), title)
            .with_duration(Duration(10))
            .into()
    }

    async fn wait_for_plays(transport: &MockTransport, count: usize) {
        for _ in 0..200 {
            if transport.plays().len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        unreachable!("expected {count} plays, saw {:?}", transport.plays());
    }

    #[tokio::test]
    async fn test_commands_round_trip() {
        let transport = Arc::new(MockTransport::connected("guild-1"));
        let session = start(&transport);

        assert_eq!(session.add_item(video("A"), None).await.unwrap(), 0);
        assert_eq!(session.add_item(video("B"), None).await.unwrap(), 1);
        session.play(None).await.unwrap();
        session.next().await.unwrap();
        session.previous().await.unwrap();

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Playing);
        assert_eq!(snapshot.cursor, Cursor::new(0, None));
        assert_eq!(transport.plays().len(), 3);

        assert!(matches!(session.remove_item(9).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_finished_event_auto_advances() {
        let transport = Arc::new(MockTransport::connected("guild-1"));
        let session = start(&transport);
        session.add_item(video("A"), None).await.unwrap();
        session.add_item(video("B"), None).await.unwrap();
        session.play(None).await.unwrap();

        transport.emit(TransportEvent::PlaybackFinished);
        wait_for_plays(&transport, 2).await;

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.cursor, Cursor::new(1, None));
    }

    #[tokio::test]
    async fn test_stop_racing_finished_ends_idle() {
        let transport = Arc::new(MockTransport::connected("guild-1"));
        let session = start(&transport);
        session.add_item(video("A"), None).await.unwrap();
        session.add_item(video("B"), None).await.unwrap();
        session.play(None).await.unwrap();

        transport.emit(TransportEvent::PlaybackFinished);
        session.stop().await.unwrap();
        // Give a late event time to be processed after the stop.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_disconnect_event_keeps_queue() {
        let transport = Arc::new(MockTransport::connected("guild-1"));
        let session = start(&transport);
        session.add_item(video("A"), None).await.unwrap();
        session.play(None).await.unwrap();

        transport.emit(TransportEvent::Disconnect);
        for _ in 0..200 {
            if session.snapshot().await.unwrap().state == PlaybackState::Idle {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.entries.len(), 1);
        assert!(matches!(session.play(None).await, Err(Error::Configuration(_))));

        session.connect().await.unwrap();
        session.play(None).await.unwrap();
        assert_eq!(transport.plays().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let transport = Arc::new(MockTransport::connected("guild-1"));
        let session = start(&transport);
        session.shutdown().await;

        assert!(matches!(session.next().await, Err(Error::SessionClosed)));
        assert!(session.is_closed());
    }
}
