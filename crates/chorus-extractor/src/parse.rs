//! Parsing of yt-dlp output.

use std::path::PathBuf;

use chorus_core::{Duration, Error, MediaMetadata, PlayableItem, Playlist, Result, Video};
use serde::Deserialize;

/// One classified line of download output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OutputLine {
    Progress(f32),
    Metadata(MediaMetadata),
    FilePath(PathBuf),
    Other,
}

/// Classify a line printed by a download run.
///
/// Progress comes as `[download]  42.3% of ...`, metadata as the JSON object
/// requested with `--print`, and the final file path as a bare line.
pub(crate) fn parse_output_line(line: &str) -> OutputLine {
    let line = line.trim();
    if line.is_empty() {
        return OutputLine::Other;
    }

    if let Some(rest) = line.strip_prefix("[download]") {
        return rest
            .split_whitespace()
            .next()
            .and_then(|token| token.strip_suffix('%'))
            .and_then(|percent| percent.parse::<f32>().ok())
            .map_or(OutputLine::Other, OutputLine::Progress);
    }

    if line.starts_with('{') {
        return serde_json::from_str::<InfoJson>(line)
            .map_or(OutputLine::Other, |info| OutputLine::Metadata(info.metadata()));
    }

    if line.starts_with('[') {
        return OutputLine::Other;
    }

    OutputLine::FilePath(PathBuf::from(line))
}

/// Subset of the yt-dlp info dictionary.
#[derive(Debug, Deserialize)]
pub(crate) struct InfoJson {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    description: Option<String>,
    uploader: Option<String>,
    #[serde(default)]
    entries: Vec<Option<InfoJson>>,
}

impl InfoJson {
    fn metadata(&self) -> MediaMetadata {
        MediaMetadata {
            title: self.title.clone(),
            duration: self.duration.map(Duration::from_secs_f64),
            thumbnail: self.thumbnail.clone(),
            description: self.description.clone(),
            uploader: self.uploader.clone(),
        }
    }

    fn page_url(&self) -> Option<&str> {
        self.webpage_url
            .as_deref()
            .or(self.original_url.as_deref())
            .or(self.url.as_deref())
    }

    fn into_video(self, downloader: &str) -> Option<Video> {
        let url = self.page_url()?.to_string();
        let metadata = self.metadata();
        let title = self.title.unwrap_or_else(|| url.clone());

        let mut video = Video::new(url, title).with_downloader(downloader);
        video.enrich(&metadata);
        Some(video)
    }
}

/// Build a queue item from `--dump-single-json` output.
pub(crate) fn item_from_info(json: &str, downloader: &str) -> Result<PlayableItem> {
    let info: InfoJson = serde_json::from_str(json)?;

    match info.kind.as_deref() {
        Some("playlist" | "multi_video") => {
            let url = info.page_url().unwrap_or_default().to_string();
            let title = info.title.clone().unwrap_or_else(|| url.clone());
            let (description, uploader, thumbnail) =
                (info.description.clone(), info.uploader.clone(), info.thumbnail.clone());

            let videos: Vec<Video> = info
                .entries
                .into_iter()
                .flatten()
                .filter_map(|entry| entry.into_video(downloader))
                .collect();

            let mut playlist = Playlist::new(url, title, videos);
            playlist.description = description;
            playlist.uploader = uploader;
            playlist.thumbnail = thumbnail;
            Ok(playlist.into())
        }
        None | Some("video" | "url" | "url_transparent") => info
            .into_video(downloader)
            .map(PlayableItem::from)
            .ok_or_else(|| Error::UnsupportedItem("media info has no URL".to_string())),
        Some(other) => Err(Error::UnsupportedItem(format!("unsupported media type '{other}'"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines() {
        assert_eq!(
            parse_output_line("[download]  42.3% of    3.47MiB at    1.20MiB/s ETA 00:02"),
            OutputLine::Progress(42.3)
        );
        assert_eq!(
            parse_output_line("[download] Destination: /tmp/x.m4a"),
            OutputLine::Other
        );
        assert_eq!(parse_output_line("[youtube] abc: Downloading webpage"), OutputLine::Other);
    }

    #[test]
    fn test_metadata_and_path_lines() {
        let line = r#"{"title": "Song", "duration": 212.4, "uploader": "Band", "thumbnail": null}"#;
        match parse_output_line(line) {
            OutputLine::Metadata(meta) => {
                assert_eq!(meta.title.as_deref(), Some("Song"));
                assert_eq!(meta.duration, Some(Duration(212)));
                assert_eq!(meta.uploader.as_deref(), Some("Band"));
            }
            other => unreachable!("expected metadata, got {other:?}"),
        }

        assert_eq!(
            parse_output_line("/home/me/.cache/chorus/audio/ab12.m4a\n"),
            OutputLine::FilePath(PathBuf::from("/home/me/.cache/chorus/audio/ab12.m4a"))
        );
    }

    #[test]
    fn test_single_video_info() {
        let json = r#"{
            "_type": "video",
            "title": "Never Gonna Give You Up",
            "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "duration": 212,
            "uploader": "Rick Astley"
        }"#;
        let item = item_from_info(json, "yt-dlp").unwrap();
        match item {
            PlayableItem::Video(video) => {
                assert_eq!(video.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
                assert_eq!(video.duration, Duration(212));
                assert_eq!(video.uploader.as_deref(), Some("Rick Astley"));
                assert!(!video.is_downloaded());
            }
            other => unreachable!("expected video, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_playlist_info() {
        let json = r#"{
            "_type": "playlist",
            "title": "Mix",
            "webpage_url": "https://www.youtube.com/playlist?list=PL1",
            "entries": [
                {"_type": "url", "url": "https://www.youtube.com/watch?v=a", "title": "A", "duration": 65.0},
                null,
                {"_type": "url", "title": "No URL"},
                {"_type": "url", "url": "https://www.youtube.com/watch?v=b", "title": "B"}
            ]
        }"#;
        let item = item_from_info(json, "yt-dlp").unwrap();
        let playlist = item.as_playlist().cloned().unwrap();
        assert_eq!(playlist.title, "Mix");
        let titles: Vec<_> = playlist.videos().iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
        assert_eq!(playlist.total_duration(), Duration(65));
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let json = r#"{"_type": "channel", "title": "x"}"#;
        assert!(matches!(item_from_info(json, "yt-dlp"), Err(Error::UnsupportedItem(_))));
        assert!(matches!(item_from_info("not json", "yt-dlp"), Err(Error::Json(_))));
    }
}
