//! Downloader collaborator interface.
//!
//! A downloader turns a remote [`Video`] into a local file the transport can
//! play. Retry and timeout policy belong to the implementation.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Duration, Video};
use crate::{Error, Result};

/// Download progress report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Completed share, 0.0 to 100.0.
    pub percent: f32,
}

impl DownloadProgress {
    pub fn new(percent: f32) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
        }
    }
}

/// Callback fired zero or more times while a download runs.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Metadata reported alongside a finished download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub uploader: Option<String>,
}

/// Result of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMedia {
    /// Where the audio landed.
    pub local_path: PathBuf,
    pub metadata: MediaMetadata,
}

/// Resolves a remote video into a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Tag matched against [`Video::downloader`].
    fn tag(&self) -> &str;

    async fn download(&self, video: &Video, progress: Option<ProgressCallback>) -> Result<DownloadedMedia>;
}

/// Set of downloaders keyed by tag.
#[derive(Clone, Default)]
pub struct Downloaders {
    by_tag: HashMap<String, Arc<dyn Downloader>>,
}

impl Downloaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a downloader, replacing any previous one with the same tag.
    #[must_use]
    pub fn with(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.insert(downloader);
        self
    }

    pub fn insert(&mut self, downloader: Arc<dyn Downloader>) {
        self.by_tag.insert(downloader.tag().to_string(), downloader);
    }

    /// Downloader responsible for `video`.
    pub fn for_video(&self, video: &Video) -> Result<Arc<dyn Downloader>> {
        self.by_tag.get(&video.downloader).cloned().ok_or_else(|| {
            Error::Configuration(format!("no downloader registered for tag '{}'", video.downloader))
        })
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

impl fmt::Debug for Downloaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_tag.keys()).finish()
    }
}
