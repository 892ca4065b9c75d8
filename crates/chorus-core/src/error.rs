//! Error types for Chorus.

use thiserror::Error;

/// Result type alias using Chorus's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Chorus.
#[derive(Error, Debug)]
pub enum Error {
    // Wiring errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Queue errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported item: {0}")]
    UnsupportedItem(String),

    // Collaborator errors
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Status notification failed: {0}")]
    Status(String),

    // Session errors
    #[error("Session closed")]
    SessionClosed,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for an index that does not resolve to a queue entry.
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Self::NotFound(format!("no item at index {index} (queue length {len})"))
    }

    /// Returns true if the session can keep serving commands after this error.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Download(_)
                | Self::UnsupportedItem(_)
                | Self::InvalidArgument(_)
                | Self::Status(_)
        )
    }

    /// Returns true if the error came from the downloader.
    pub const fn is_download(&self) -> bool {
        matches!(self, Self::Download(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverable() {
        assert!(Error::NotFound("test".into()).is_recoverable());
        assert!(Error::Download("boom".into()).is_recoverable());
        assert!(!Error::Configuration("no transport".into()).is_recoverable());
        assert!(!Error::SessionClosed.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::index_out_of_bounds(4, 2);
        assert_eq!(err.to_string(), "Not found: no item at index 4 (queue length 2)");
    }
}
