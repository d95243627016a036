use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliverError {
    #[error("no recipients configured; refusing to send")]
    NoRecipients,

    #[error("cannot read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("token file {0} has no access token")]
    MissingToken(PathBuf),

    #[error("invalid endpoint URL: {0}")]
    Endpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "google")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "google")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeliverError {
    /// Deliberate no-op rather than a failure of the remote side.
    pub fn is_refusal(&self) -> bool {
        matches!(self, DeliverError::NoRecipients)
    }
}
