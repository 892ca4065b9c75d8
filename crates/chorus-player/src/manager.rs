//! Queue manager: the per-session playback state machine.
//!
//! Owns one queue, its cursor and the playback state, and is the only thing
//! that mutates them. Every failing operation leaves the state as it was
//! before the call; only `stop`, `clear` and a transport disconnect ever take
//! the manager back to [`PlaybackState::Idle`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chorus_core::{
    Cursor, Direction, Downloaders, Duration, Error, ItemKind, PlayableItem, ProgressCallback,
    Queue, Result, Target,
};
use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::status::{StatusNotifier, StatusSink};
use crate::transport::{OwnerId, Transport, TransportEvent};

/// Minimum progress change, in percent, between two download status edits.
const PROGRESS_STEP: f32 = 10.0;

/// Playback state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

/// One row of a [`QueueSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub title: String,
    pub kind: ItemKind,
    pub duration: Duration,
}

/// Point-in-time view of a session for front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub owner: OwnerId,
    pub state: PlaybackState,
    pub cursor: Cursor,
    pub entries: Vec<SnapshotEntry>,
    pub total_duration: Duration,
}

/// Drives downloads and the transport for one queue.
pub struct QueueManager {
    owner: OwnerId,
    queue: Queue,
    state: PlaybackState,
    transport: Arc<dyn Transport>,
    downloaders: Downloaders,
    notifier: StatusNotifier,
}

impl QueueManager {
    pub fn new(transport: Arc<dyn Transport>, status: Arc<dyn StatusSink>, downloaders: Downloaders) -> Self {
        Self {
            owner: transport.owner_id(),
            queue: Queue::new(),
            state: PlaybackState::Idle,
            transport,
            downloaders,
            notifier: StatusNotifier::new(status),
        }
    }

    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    pub const fn queue(&self) -> &Queue {
        &self.queue
    }

    pub const fn cursor(&self) -> Cursor {
        self.queue.cursor()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            owner: self.owner.clone(),
            state: self.state,
            cursor: self.queue.cursor(),
            entries: self
                .queue
                .items()
                .iter()
                .map(|item| SnapshotEntry {
                    title: item.title().to_string(),
                    kind: item.kind(),
                    duration: item.duration(),
                })
                .collect(),
            total_duration: self.queue.total_duration(),
        }
    }

    /// Open the transport connection.
    pub async fn connect(&mut self) -> Result<()> {
        self.transport.connect().await?;
        info!(owner = %self.owner, "Transport connected");
        Ok(())
    }

    /// Play the item at `index`, or at the cursor when `None`.
    /// The cursor is left where it was if anything fails.
    pub async fn play(&mut self, index: Option<usize>) -> Result<()> {
        self.ensure_connected()?;
        let before = self.queue.cursor();
        let result = self.seek_and_dispatch(index).await;
        if result.is_err() {
            self.queue.restore(before);
        }
        result
    }

    async fn seek_and_dispatch(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(index) = index {
            self.queue.seek(index)?;
        }
        let cursor = self.queue.enter_current()?;
        self.dispatch(cursor).await
    }

    /// Advance the cursor and play what it lands on.
    pub async fn next(&mut self) -> Result<()> {
        self.step(Direction::Forward).await
    }

    /// Step the cursor back and play what it lands on.
    pub async fn previous(&mut self) -> Result<()> {
        self.step(Direction::Backward).await
    }

    async fn step(&mut self, direction: Direction) -> Result<()> {
        self.ensure_connected()?;
        let cursor = self.queue.advance(direction);
        debug!(owner = %self.owner, ?direction, ?cursor, "Cursor moved");
        self.play(None).await
    }

    /// Halt playback. Always signals the transport, even when already idle.
    pub async fn stop(&mut self) -> Result<()> {
        self.state = PlaybackState::Idle;
        self.transport.stop().await?;
        info!(owner = %self.owner, "Playback stopped");
        Ok(())
    }

    /// Empty the queue and go idle.
    pub async fn clear(&mut self) -> Result<()> {
        let was_playing = self.state == PlaybackState::Playing;
        self.queue.clear();
        self.state = PlaybackState::Idle;
        if was_playing {
            self.transport.stop().await?;
        }
        self.announce("Cleared the queue").await;
        Ok(())
    }

    /// Insert `item` at `index` (or append). Returns its position.
    pub async fn add_item(&mut self, item: PlayableItem, index: Option<usize>) -> Result<usize> {
        let title = item.title().to_string();
        let position = self.queue.insert(item, index)?;
        debug!(owner = %self.owner, position, "Item added");
        self.announce(&format!("Added {title} to the queue at position {}", position + 1))
            .await;
        Ok(position)
    }

    /// Remove the item at `index`. The cursor is not adjusted.
    pub async fn remove_item(&mut self, index: usize) -> Result<PlayableItem> {
        let item = self.queue.remove(index)?;
        self.announce(&format!("Removed {} from the queue", item.title())).await;
        Ok(item)
    }

    /// Exchange two queue positions.
    pub async fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.queue.swap(a, b)?;
        let text = match (self.queue.get(a), self.queue.get(b)) {
            (Some(first), Some(second)) => format!("Swapped {} and {}", first.title(), second.title()),
            _ => return Err(Error::Internal("swapped positions vanished".to_string())),
        };
        self.announce(&text).await;
        Ok(())
    }

    /// Shuffle with the thread-local generator.
    pub async fn shuffle(&mut self, exclude_playlists: bool) -> Result<()> {
        // ThreadRng is not Send; it must not live across the await below.
        self.queue.shuffle(&mut rand::rng(), exclude_playlists);
        self.shuffled(exclude_playlists).await
    }

    /// Shuffle with a caller-supplied generator.
    pub async fn shuffle_with<R: Rng + Send + ?Sized>(&mut self, rng: &mut R, exclude_playlists: bool) -> Result<()> {
        self.queue.shuffle(rng, exclude_playlists);
        self.shuffled(exclude_playlists).await
    }

    async fn shuffled(&self, exclude_playlists: bool) -> Result<()> {
        debug!(owner = %self.owner, exclude_playlists, "Queue shuffled");
        self.announce("Shuffled the queue").await;
        Ok(())
    }

    /// React to a transport event.
    pub async fn handle_event(&mut self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::Disconnect => {
                info!(owner = %self.owner, "Transport disconnected");
                self.state = PlaybackState::Idle;
                Ok(())
            }
            TransportEvent::PlaybackFinished if self.state == PlaybackState::Playing => {
                debug!(owner = %self.owner, "Playback finished, advancing");
                if let Err(e) = self.next().await {
                    self.announce(&format!("Could not play the next item: {e}")).await;
                    return Err(e);
                }
                Ok(())
            }
            TransportEvent::PlaybackFinished => {
                debug!(owner = %self.owner, "Ignoring playback finished while idle");
                Ok(())
            }
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.transport.is_connected() {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "transport for {} is not connected",
                self.owner
            )))
        }
    }

    /// Start a play cycle for a resolved cursor.
    async fn dispatch(&mut self, cursor: Cursor) -> Result<()> {
        self.notifier.begin_cycle();

        let (title, ready) = match self.queue.target(cursor) {
            Some(Target::Sound(sound)) => (sound.name.clone(), Some(sound.path.clone())),
            Some(Target::Video(video)) => (video.display_title(), video.local_path().map(Path::to_path_buf)),
            None => return Err(Error::NotFound(format!("nothing playable at {cursor:?}"))),
        };

        let path = match ready {
            Some(path) => path,
            None => self.fetch(cursor, &title).await?,
        };

        self.transport.play(&path).await?;
        self.state = PlaybackState::Playing;
        info!(owner = %self.owner, ?cursor, "Now playing {title}");
        self.update_status(&format!("Now playing: {title}")).await;
        Ok(())
    }

    /// Download the video at `cursor` and memoize its path.
    async fn fetch(&mut self, cursor: Cursor, title: &str) -> Result<PathBuf> {
        let video = match self.queue.target(cursor) {
            Some(Target::Video(video)) => video.clone(),
            _ => return Err(Error::NotFound(format!("no video at {cursor:?}"))),
        };
        let downloader = self.downloaders.for_video(&video)?;

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let callback: ProgressCallback = Arc::new(move |progress| {
            let _ = progress_tx.send(progress);
        });

        info!(owner = %self.owner, url = %video.url, "Downloading {title}");
        self.update_status(&format!("Downloading {title}...")).await;

        let download = async move { downloader.download(&video, Some(callback)).await };
        tokio::pin!(download);

        let mut last_reported = 0.0_f32;
        let result = loop {
            tokio::select! {
                result = &mut download => break result,
                Some(progress) = progress_rx.recv() => {
                    if progress.percent - last_reported >= PROGRESS_STEP {
                        last_reported = progress.percent;
                        self.update_status(&format!("Downloading {title}: {:.0}%", progress.percent))
                            .await;
                    }
                }
            }
        };

        let media = result.inspect_err(|e| warn!(owner = %self.owner, "Download of {title} failed: {e}"))?;

        let video = self
            .queue
            .video_mut(cursor)
            .ok_or_else(|| Error::Internal(format!("video at {cursor:?} vanished during download")))?;
        video.memoize_path(media.local_path);
        video.enrich(&media.metadata);

        video
            .local_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Internal("downloaded path was not recorded".to_string()))
    }

    /// Create or edit the play cycle's notification. Sink failures are logged.
    async fn update_status(&mut self, text: &str) {
        if let Err(e) = self.notifier.update(text).await {
            warn!(owner = %self.owner, "Status update failed: {e}");
        }
    }

    /// Send a standalone notification. Sink failures are logged.
    async fn announce(&self, text: &str) {
        if let Err(e) = self.notifier.announce(text).await {
            warn!(owner = %self.owner, "Status announcement failed: {e}");
        }
    }
}
