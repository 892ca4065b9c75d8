//! # chorus-extractor
//!
//! yt-dlp backed [`Downloader`] for Chorus.
//!
//! Features:
//! - Disk caching keyed by the video URL, so repeated plays skip yt-dlp
//! - Download progress parsed from yt-dlp's line-oriented output
//! - URL resolution into queue items (single videos and flat playlists)

mod config;
mod parse;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chorus_core::{
    DownloadProgress, DownloadedMedia, Downloader, Error, MediaMetadata, PlayableItem,
    ProgressCallback, Result, Video, DEFAULT_DOWNLOADER,
};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

pub use config::{AuthMethod, ExtractorConfig, DEFAULT_FORMAT};
use parse::{item_from_info, parse_output_line, OutputLine};

/// Downloader and resolver driving the yt-dlp executable.
pub struct YtDlp {
    config: ExtractorConfig,
}

impl YtDlp {
    /// Create a downloader, making sure the cache directory exists.
    pub fn new(config: ExtractorConfig) -> Self {
        if let Err(e) = fs::create_dir_all(&config.cache_dir) {
            warn!("Failed to create cache directory {:?}: {e}", config.cache_dir);
        }
        Self { config }
    }

    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Clear the disk cache.
    pub fn clear_cache(&self) {
        if let Err(e) = fs::remove_dir_all(&self.config.cache_dir) {
            warn!("Failed to clear cache: {e}");
        }
        let _ = fs::create_dir_all(&self.config.cache_dir);
        info!("Audio cache cleared");
    }

    /// Check if audio is cached for a URL.
    pub fn is_cached(&self, url: &str) -> bool {
        self.cached_file(url).is_some()
    }

    /// Cached, non-empty file for a URL, whatever extension yt-dlp chose.
    fn cached_file(&self, url: &str) -> Option<PathBuf> {
        let key = cache_key(url);
        let entries = fs::read_dir(&self.config.cache_dir).ok()?;

        entries.flatten().map(|entry| entry.path()).find(|path| {
            path.file_stem().is_some_and(|stem| stem == key.as_str())
                && fs::metadata(path).is_ok_and(|m| m.len() > 0)
        })
    }

    fn check_executable(&self) -> Result<()> {
        let path = &self.config.yt_dlp_path;
        if path.is_absolute() && !path.exists() {
            return Err(Error::Configuration(format!("yt-dlp not found at {path:?}")));
        }
        Ok(())
    }

    fn download_args(&self, url: &str) -> Vec<String> {
        let template = self
            .config
            .cache_dir
            .join(format!("{}.%(ext)s", cache_key(url)));

        let mut args = self.config.auth.to_args();
        args.extend([
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "-f".to_string(),
            self.config.format.clone(),
            "-o".to_string(),
            template.display().to_string(),
            "--print".to_string(),
            "after_move:%(.{title,duration,thumbnail,description,uploader})j".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            url.to_string(),
        ]);
        args
    }

    /// Resolve a URL into a queue item: a video, or a playlist of videos.
    pub async fn resolve(&self, url: &str) -> Result<PlayableItem> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidArgument(format!("invalid URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidArgument(format!("unsupported URL scheme '{}'", parsed.scheme())));
        }
        self.check_executable()?;

        let mut args = self.config.auth.to_args();
        args.extend([
            "--no-warnings".to_string(),
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            url.to_string(),
        ]);

        debug!("Resolving {url} with yt-dlp");
        let output = Command::new(&self.config.yt_dlp_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| Error::Download(format!("Failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp stderr: {}", stderr);
            return Err(Error::Download(format!(
                "yt-dlp failed: {}",
                stderr.lines().next().unwrap_or("Unknown error")
            )));
        }

        let item = item_from_info(&String::from_utf8_lossy(&output.stdout), DEFAULT_DOWNLOADER)?;
        info!("Resolved {url} to {} '{}'", item.kind(), item.title());
        Ok(item)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

#[async_trait]
impl Downloader for YtDlp {
    fn tag(&self) -> &str {
        DEFAULT_DOWNLOADER
    }

    async fn download(&self, video: &Video, progress: Option<ProgressCallback>) -> Result<DownloadedMedia> {
        // Check cache first - instant return if cached
        if let Some(path) = self.cached_file(&video.url) {
            info!("Cache hit for {}", video.url);
            return Ok(DownloadedMedia {
                local_path: path,
                metadata: MediaMetadata::default(),
            });
        }

        info!("Cache miss - downloading {}", video.url);
        self.check_executable()?;

        let mut child = Command::new(&self.config.yt_dlp_path)
            .args(self.download_args(&video.url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Download(format!("Failed to spawn yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Download("Failed to capture yt-dlp stdout".to_string()))?;

        // Drain stderr separately so a chatty yt-dlp never blocks on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let mut metadata = MediaMetadata::default();
        let mut local_path = None;
        let mut lines = BufReader::new(stdout).lines();

        while let Some(line) = lines.next_line().await? {
            match parse_output_line(&line) {
                OutputLine::Progress(percent) => {
                    if let Some(callback) = &progress {
                        callback(DownloadProgress::new(percent));
                    }
                }
                OutputLine::Metadata(meta) => metadata = meta,
                OutputLine::FilePath(path) => local_path = Some(path),
                OutputLine::Other => {}
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Download(format!("Failed to wait for yt-dlp: {e}")))?;

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            warn!("yt-dlp stderr: {}", stderr);
            return Err(Error::Download(format!(
                "yt-dlp failed: {}",
                stderr.lines().next().unwrap_or("Unknown error")
            )));
        }

        let local_path = local_path
            .filter(|path| is_non_empty_file(path))
            .ok_or_else(|| Error::Download("yt-dlp did not produce an audio file".to_string()))?;

        info!("Downloaded {} to {:?}", video.url, local_path);
        Ok(DownloadedMedia { local_path, metadata })
    }
}

/// Cache file stem for a URL.
fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}
