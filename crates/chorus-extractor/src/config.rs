//! Extractor configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default yt-dlp format selector, preferring m4a audio.
pub const DEFAULT_FORMAT: &str = "141/140/bestaudio[ext=m4a]/bestaudio[ext=webm]/bestaudio";

/// Authentication method for yt-dlp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Use cookies from a browser profile.
    BrowserCookies(String),
    /// Use a Netscape-format cookie file.
    CookieFile(PathBuf),
    /// No authentication.
    #[default]
    None,
}

impl AuthMethod {
    pub(crate) fn to_args(&self) -> Vec<String> {
        match self {
            Self::BrowserCookies(browser) => {
                vec!["--cookies-from-browser".to_string(), browser.clone()]
            }
            Self::CookieFile(path) => {
                vec!["--cookies".to_string(), path.display().to_string()]
            }
            Self::None => vec![],
        }
    }
}

/// Settings for [`crate::YtDlp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// yt-dlp executable; a bare name is looked up on `PATH`.
    pub yt_dlp_path: PathBuf,
    /// Directory downloaded audio is kept in.
    pub cache_dir: PathBuf,
    pub auth: AuthMethod,
    /// yt-dlp `-f` selector.
    pub format: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let cache_dir = directories::ProjectDirs::from("", "", "chorus")
            .map_or_else(|| PathBuf::from(".cache/audio"), |d| d.cache_dir().join("audio"));

        Self {
            yt_dlp_path: PathBuf::from("yt-dlp"),
            cache_dir,
            auth: AuthMethod::default(),
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_args() {
        assert!(AuthMethod::None.to_args().is_empty());
        assert_eq!(
            AuthMethod::BrowserCookies("firefox".into()).to_args(),
            ["--cookies-from-browser", "firefox"]
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ExtractorConfig =
            serde_json::from_str(r#"{"auth": {"browser_cookies": "chrome"}}"#).unwrap();
        assert_eq!(config.auth, AuthMethod::BrowserCookies("chrome".into()));
        assert_eq!(config.format, DEFAULT_FORMAT);
        assert_eq!(config.yt_dlp_path, PathBuf::from("yt-dlp"));
    }
}
