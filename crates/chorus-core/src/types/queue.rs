//! Queue and two-level cursor.
//!
//! The cursor walks top-level entries and, while it sits on a playlist that
//! playback has entered, the playlist's videos. Advancing past either end of a
//! playlist leaves it and moves to the neighbouring top-level entry; wrapping
//! only ever happens against the top-level length.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Duration, PlayableItem, Sound, Video};
use crate::{Error, Result};

/// Position of playback within the queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub struct Cursor {
    /// Index into the top-level queue.
    pub top: usize,
    /// Index into the playlist at `top`, once traversal has entered it.
    pub sub: Option<usize>,
}

impl Cursor {
    pub const fn new(top: usize, sub: Option<usize>) -> Self {
        Self { top, sub }
    }
}

/// Direction of a cursor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    const fn step(self, index: usize) -> Option<usize> {
        match self {
            Self::Forward => index.checked_add(1),
            Self::Backward => index.checked_sub(1),
        }
    }
}

/// What a resolved cursor points at.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Video(&'a Video),
    Sound(&'a Sound),
}

/// The ordered playback queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Queue {
    /// Items in playback order.
    items: Vec<PlayableItem>,
    /// Current playback position.
    cursor: Cursor,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all items in the queue.
    pub fn items(&self) -> &[PlayableItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&PlayableItem> {
        self.items.get(index)
    }

    /// Get the number of top-level items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Top-level item under the cursor.
    pub fn current(&self) -> Option<&PlayableItem> {
        self.items.get(self.cursor.top)
    }

    /// Sum of all known durations, playlists included.
    pub fn total_duration(&self) -> Duration {
        self.items.iter().map(PlayableItem::duration).sum()
    }

    /// Insert at `index`, shifting later items, or append when `None`.
    /// Returns the position the item landed at. The cursor is left alone.
    pub fn insert(&mut self, item: PlayableItem, index: Option<usize>) -> Result<usize> {
        let len = self.items.len();
        match index {
            Some(index) if index > len => Err(Error::index_out_of_bounds(index, len)),
            Some(index) => {
                self.items.insert(index, item);
                Ok(index)
            }
            None => {
                self.items.push(item);
                Ok(len)
            }
        }
    }

    /// Remove the item at `index`.
    ///
    /// The cursor is intentionally not adjusted, so removing an earlier entry
    /// makes it point at whatever shifted into its slot.
    pub fn remove(&mut self, index: usize) -> Result<PlayableItem> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Exchange two top-level positions.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        self.items.swap(a, b);
        Ok(())
    }

    /// Randomly permute the queue and, unless `exclude_playlists`, each
    /// playlist's videos. Resets the cursor to the start.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R, exclude_playlists: bool) {
        self.items.shuffle(rng);
        if !exclude_playlists {
            for playlist in self.items.iter_mut().filter_map(PlayableItem::as_playlist_mut) {
                playlist.shuffle(rng);
            }
        }
        self.cursor = Cursor::default();
    }

    /// Clear the entire queue.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = Cursor::default();
    }

    /// Point the cursor at a top-level index. Re-selecting the current entry
    /// keeps its nested position.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if index != self.cursor.top {
            self.cursor = Cursor::new(index, None);
        }
        Ok(())
    }

    /// Put the cursor back to a position previously read from [`Queue::cursor`].
    pub fn restore(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Step the cursor one entry in `direction`.
    pub fn advance(&mut self, direction: Direction) -> Cursor {
        let len = self.items.len();
        if len == 0 {
            self.cursor = Cursor::default();
            return self.cursor;
        }

        let Cursor { top, sub } = self.cursor;
        let nested_len = self
            .items
            .get(top)
            .and_then(PlayableItem::as_playlist)
            .map_or(0, |playlist| playlist.len());

        // Inside a playlist, step within it; falling off either edge leaves it.
        let (top, sub) = match sub.and_then(|s| direction.step(s)).filter(|&s| s < nested_len) {
            Some(next_sub) => (Some(top), Some(next_sub)),
            None => (direction.step(top), None),
        };

        self.cursor = match top {
            None => Cursor::new(len - 1, None),
            Some(top) if top >= len => Cursor::new(0, None),
            Some(top) => Cursor::new(top, sub),
        };
        self.cursor
    }

    /// Resolve the cursor to a playable position, entering a playlist at its
    /// first video if traversal has not started yet.
    pub fn enter_current(&mut self) -> Result<Cursor> {
        let len = self.items.len();
        let Cursor { top, sub } = self.cursor;
        let item = self
            .items
            .get(top)
            .ok_or_else(|| Error::index_out_of_bounds(top, len))?;

        self.cursor.sub = match item {
            PlayableItem::Playlist(playlist) => {
                let sub = sub.unwrap_or(0);
                if sub >= playlist.len() {
                    return Err(Error::NotFound(format!(
                        "playlist '{}' has no video at position {sub}",
                        playlist.title
                    )));
                }
                Some(sub)
            }
            PlayableItem::Video(_) | PlayableItem::Sound(_) => None,
        };
        Ok(self.cursor)
    }

    /// Look up the video or sound at a resolved cursor.
    pub fn target(&self, cursor: Cursor) -> Option<Target<'_>> {
        match (self.items.get(cursor.top)?, cursor.sub) {
            (PlayableItem::Video(video), None) => Some(Target::Video(video)),
            (PlayableItem::Sound(sound), None) => Some(Target::Sound(sound)),
            (PlayableItem::Playlist(playlist), Some(sub)) => playlist.video(sub).map(Target::Video),
            _ => None,
        }
    }

    /// Mutable access to the video at a resolved cursor.
    pub fn video_mut(&mut self, cursor: Cursor) -> Option<&mut Video> {
        match (self.items.get_mut(cursor.top)?, cursor.sub) {
            (PlayableItem::Video(video), None) => Some(video),
            (PlayableItem::Playlist(playlist), Some(sub)) => playlist.video_mut(sub),
            _ => None,
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(Error::index_out_of_bounds(index, self.items.len()))
        }
    }
}
