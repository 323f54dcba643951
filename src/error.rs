use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request for {path} timed out")]
    Timeout { path: String },

    #[error("HTTP status error: {status} for {path}")]
    HttpStatus { status: u16, path: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Sync configuration error: {reason}")]
    SyncConfig { reason: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("Episode tree error: {reason}")]
    EpisodeTree { reason: String },

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl ReaderError {
    /// Transient failures warrant a retry affordance; not-found and
    /// cancellation do not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReaderError::Http(_) | ReaderError::Timeout { .. } | ReaderError::HttpStatus { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
