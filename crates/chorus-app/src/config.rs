//! Application configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chorus_extractor::ExtractorConfig;
use chorus_player::SessionConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CHORUS_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extractor: ExtractorConfig,
    pub session: SessionConfig,
    /// External player invocation; the file path is appended as the last argument.
    pub player: Vec<String>,
    /// Owner id of the console session.
    pub owner: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            session: SessionConfig::default(),
            player: ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]
                .into_iter()
                .map(String::from)
                .collect(),
            owner: "console".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `$CHORUS_CONFIG`, else the platform config file, else defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "chorus").map(|dirs| dirs.config_dir().join("config.json"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"owner": "studio", "session": {{"command_capacity": 8}}}}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.owner, "studio");
        assert_eq!(config.session.command_capacity, 8);
        assert_eq!(config.player[0], "ffplay");
        assert_eq!(config.extractor, ExtractorConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(AppConfig::from_file(file.path()).is_err());
    }
}
