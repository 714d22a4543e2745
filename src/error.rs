use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing credentials or an unreadable config file.
    #[error("config error: {0}")]
    Config(String),

    /// The archive answered a search or detail request with a non-success status.
    #[error("problem fetching {url}: status {status}")]
    Request { url: String, status: StatusCode },

    /// Programme metadata is malformed or lacks something the filename or URI needs.
    #[error("lookup failed for {programme}: {reason}")]
    Lookup { programme: String, reason: String },

    /// Transfer of one media file failed.
    #[error("problem downloading {uri}: {reason}")]
    Download { uri: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn lookup(programme: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Lookup {
            programme: programme.into(),
            reason: reason.into(),
        }
    }

    pub fn download(uri: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AppError::Download {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
