//! Core domain types for Chorus.

pub mod common;
pub mod item;
pub mod playlist;
pub mod queue;
pub mod sound;
pub mod video;

pub use common::Duration;
pub use item::{ItemKind, PlayableItem};
pub use playlist::Playlist;
pub use queue::{Cursor, Direction, Queue, Target};
pub use sound::Sound;
pub use video::{Video, DEFAULT_DOWNLOADER};
