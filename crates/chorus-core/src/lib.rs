//! # chorus-core
//!
//! Core types, traits, and error handling for the Chorus playback-queue
//! orchestrator.

pub mod download;
pub mod error;
pub mod types;

pub use download::{
    DownloadProgress, DownloadedMedia, Downloader, Downloaders, MediaMetadata, ProgressCallback,
};
pub use error::{Error, Result};
pub use types::*;
