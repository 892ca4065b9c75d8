//! In-memory collaborators for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chorus_core::{
    DownloadProgress, DownloadedMedia, Downloader, Duration, Error, MediaMetadata,
    ProgressCallback, Result, Video, DEFAULT_DOWNLOADER,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::status::{StatusHandle, StatusSink};
use crate::transport::{OwnerId, Transport, TransportEvent};

pub struct MockTransport {
    owner: OwnerId,
    connected: AtomicBool,
    fail_play: AtomicBool,
    plays: Mutex<Vec<PathBuf>>,
    stops: AtomicUsize,
    events: broadcast::Sender<TransportEvent>,
}

impl MockTransport {
    pub fn connected(owner: &str) -> Self {
        let transport = Self::disconnected(owner);
        transport.connected.store(true, Ordering::SeqCst);
        transport
    }

    pub fn disconnected(owner: &str) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            owner: OwnerId::from(owner),
            connected: AtomicBool::new(false),
            fail_play: AtomicBool::new(false),
            plays: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            events,
        }
    }

    pub fn plays(&self) -> Vec<PathBuf> {
        self.plays.lock().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    pub fn emit(&self, event: TransportEvent) {
        if event == TransportEvent::Disconnect {
            self.connected.store(false, Ordering::SeqCst);
        }
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn owner_id(&self) -> OwnerId {
        self.owner.clone()
    }

    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn play(&self, path: &Path) -> Result<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(Error::Transport("mock transport refused".to_string()));
        }
        self.plays.lock().push(path.to_path_buf());
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}

/// Downloader that "downloads" to `/downloads/<title>.m4a`.
#[derive(Default)]
pub struct MockDownloader {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl MockDownloader {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| *u == url).count()
    }

    pub fn fail_on(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn path_for(title: &str) -> PathBuf {
        PathBuf::from(format!("/downloads/{title}.m4a"))
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn tag(&self) -> &str {
        DEFAULT_DOWNLOADER
    }

    async fn download(&self, video: &Video, progress: Option<ProgressCallback>) -> Result<DownloadedMedia> {
        self.calls.lock().push(video.url.clone());
        if self.failing.lock().contains(&video.url) {
            return Err(Error::Download(format!("unavailable: {}", video.url)));
        }

        if let Some(callback) = progress {
            for percent in [5.0, 50.0, 100.0] {
                callback(DownloadProgress::new(percent));
                tokio::task::yield_now().await;
            }
        }

        Ok(DownloadedMedia {
            local_path: Self::path_for(&video.title),
            metadata: MediaMetadata {
                uploader: Some("Mock Uploader".to_string()),
                duration: Some(Duration(42)),
                ..MediaMetadata::default()
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Send(String, String),
    Edit(String, String),
}

/// Sink that records every call and mints `msg-N` handles.
#[derive(Default)]
pub struct RecordingSink {
    ops: Mutex<Vec<SinkOp>>,
    sent: AtomicUsize,
}

impl RecordingSink {
    pub fn ops(&self) -> Vec<SinkOp> {
        self.ops.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.ops
            .lock()
            .iter()
            .map(|op| match op {
                SinkOp::Send(_, text) | SinkOp::Edit(_, text) => text.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl StatusSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<StatusHandle> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = format!("msg-{n}");
        self.ops.lock().push(SinkOp::Send(handle.clone(), text.to_string()));
        Ok(StatusHandle(handle))
    }

    async fn edit(&self, handle: &StatusHandle, text: &str) -> Result<()> {
        self.ops.lock().push(SinkOp::Edit(handle.0.clone(), text.to_string()));
        Ok(())
    }
}
