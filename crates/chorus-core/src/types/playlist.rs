//! Playlist type representing an ordered collection of videos.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Duration, Video};

/// A remote playlist queued as a single entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    /// Playlist URL.
    pub url: String,
    /// Playlist title.
    pub title: String,
    /// Description text.
    pub description: Option<String>,
    /// Owner/author name.
    pub uploader: Option<String>,
    /// Thumbnail URL.
    pub thumbnail: Option<String>,
    /// Videos in playback order.
    videos: Vec<Video>,
}

impl Playlist {
    pub fn new(url: impl Into<String>, title: impl Into<String>, videos: Vec<Video>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: None,
            uploader: None,
            thumbnail: None,
            videos,
        }
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn video(&self, index: usize) -> Option<&Video> {
        self.videos.get(index)
    }

    /// Mutable access is limited to single entries so the order stays fixed.
    pub fn video_mut(&mut self, index: usize) -> Option<&mut Video> {
        self.videos.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Sum of the known video durations.
    pub fn total_duration(&self) -> Duration {
        self.videos.iter().map(|v| v.duration).sum()
    }

    /// Randomly reorder the nested videos.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.videos.shuffle(rng);
    }

    /// Get subtitle text showing author and video count.
    pub fn subtitle(&self) -> String {
        let mut parts = Vec::new();

        if let Some(uploader) = &self.uploader {
            parts.push(uploader.clone());
        }

        let count = self.videos.len();
        let noun = if count == 1 { "video" } else { "videos" };
        parts.push(format!("{count} {noun}"));

        parts.join(" \u{2022} ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample() -> Playlist {
        Playlist::new(
            "https://youtube.com/playlist?list=PL1",
            "Mix",
            (0..8)
                .map(|i| Video::new(format!("https://youtu.be/{i}"), format!("V{i}")).with_duration(Duration(10)))
                .collect(),
        )
    }

    #[test]
    fn test_playlist_totals() {
        let playlist = sample();
        assert_eq!(playlist.len(), 8);
        assert_eq!(playlist.total_duration(), Duration(80));
    }

    #[test]
    fn test_playlist_subtitle() {
        let mut playlist = sample();
        playlist.uploader = Some("User".into());
        assert_eq!(playlist.subtitle(), "User \u{2022} 8 videos");
    }

    #[test]
    fn test_shuffle_keeps_videos() {
        let mut playlist = sample();
        playlist.shuffle(&mut StdRng::seed_from_u64(7));

        let mut titles: Vec<_> = playlist.videos().iter().map(|v| v.title.clone()).collect();
        titles.sort();
        let expected: Vec<_> = (0..8).map(|i| format!("V{i}")).collect();
        assert_eq!(titles, expected);
    }
}
