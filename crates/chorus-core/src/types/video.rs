//! Video type representing a single remote media entry.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Duration;
use crate::download::MediaMetadata;

/// Tag of the downloader used when none is given.
pub const DEFAULT_DOWNLOADER: &str = "yt-dlp";

/// A remote video whose audio is fetched before playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Video {
    /// Page URL the downloader resolves.
    pub url: String,
    /// Video title.
    pub title: String,
    /// Video duration.
    pub duration: Duration,
    /// Thumbnail URL.
    pub thumbnail: Option<String>,
    /// Description text.
    pub description: Option<String>,
    /// Uploader or channel name.
    pub uploader: Option<String>,
    /// Tag of the downloader responsible for this video.
    pub downloader: String,
    /// Local file, set once by the first successful download.
    local_path: Option<PathBuf>,
}

impl Video {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            duration: Duration::ZERO,
            thumbnail: None,
            description: None,
            uploader: None,
            downloader: DEFAULT_DOWNLOADER.to_string(),
            local_path: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    #[must_use]
    pub fn with_downloader(mut self, tag: impl Into<String>) -> Self {
        self.downloader = tag.into();
        self
    }

    /// Mark the video as already available on disk.
    #[must_use]
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Local file path, if downloaded.
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub const fn is_downloaded(&self) -> bool {
        self.local_path.is_some()
    }

    /// Record the downloaded file. Returns false and keeps the existing path
    /// if one was already recorded.
    pub fn memoize_path(&mut self, path: impl Into<PathBuf>) -> bool {
        if self.local_path.is_some() {
            return false;
        }
        self.local_path = Some(path.into());
        true
    }

    /// Fill fields that are still empty from downloader metadata.
    pub fn enrich(&mut self, metadata: &MediaMetadata) {
        if self.duration.is_zero() {
            if let Some(duration) = metadata.duration {
                self.duration = duration;
            }
        }
        if self.title.is_empty() {
            if let Some(title) = &metadata.title {
                self.title.clone_from(title);
            }
        }
        if self.thumbnail.is_none() {
            self.thumbnail.clone_from(&metadata.thumbnail);
        }
        if self.description.is_none() {
            self.description.clone_from(&metadata.description);
        }
        if self.uploader.is_none() {
            self.uploader.clone_from(&metadata.uploader);
        }
    }

    /// Title with the duration appended when known.
    pub fn display_title(&self) -> String {
        if self.duration.is_zero() {
            self.title.clone()
        } else {
            format!("{} [{}]", self.title, self.duration)
        }
    }
}
