//! The closed set of things a queue can hold.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Duration, Playlist, Sound, Video};

/// A single queue entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlayableItem {
    Video(Video),
    Playlist(Playlist),
    Sound(Sound),
}

/// Discriminant of [`PlayableItem`], for display and snapshots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Video,
    Playlist,
    Sound,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Playlist => "playlist",
            Self::Sound => "sound",
        })
    }
}

impl PlayableItem {
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Video(_) => ItemKind::Video,
            Self::Playlist(_) => ItemKind::Playlist,
            Self::Sound(_) => ItemKind::Sound,
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &str {
        match self {
            Self::Video(video) => &video.title,
            Self::Playlist(playlist) => &playlist.title,
            Self::Sound(sound) => &sound.name,
        }
    }

    /// Known playing time; sounds report zero.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Video(video) => video.duration,
            Self::Playlist(playlist) => playlist.total_duration(),
            Self::Sound(_) => Duration::ZERO,
        }
    }

    pub const fn as_playlist(&self) -> Option<&Playlist> {
        match self {
            Self::Playlist(playlist) => Some(playlist),
            _ => None,
        }
    }

    pub fn as_playlist_mut(&mut self) -> Option<&mut Playlist> {
        match self {
            Self::Playlist(playlist) => Some(playlist),
            _ => None,
        }
    }
}

impl From<Video> for PlayableItem {
    fn from(video: Video) -> Self {
        Self::Video(video)
    }
}

impl From<Playlist> for PlayableItem {
    fn from(playlist: Playlist) -> Self {
        Self::Playlist(playlist)
    }
}

impl From<Sound> for PlayableItem {
    fn from(sound: Sound) -> Self {
        Self::Sound(sound)
    }
}
