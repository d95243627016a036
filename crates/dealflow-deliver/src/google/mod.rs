//! Google REST clients sharing one bearer-token file.
//!
//! The token file is the `token.json` an OAuth helper writes (either a `token`
//! or an `access_token` key). It is re-read on every call so an external
//! refresher can rotate it; no refresh happens here.

mod gmail;
mod sheets;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::error::DeliverError;

pub use gmail::{GMAIL_BASE_URL, GmailClient, build_mime};
pub use sheets::{SHEETS_BASE_URL, SheetsClient};

#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(default, alias = "access_token")]
    token: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Read the access token from `path`.
pub(crate) fn load_access_token(path: &Path) -> Result<String, DeliverError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DeliverError::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file: TokenFile = serde_json::from_str(&raw)?;
    if let Some(expiry) = file.expiry.as_deref().and_then(parse_expiry)
        && expiry < Utc::now()
    {
        warn!(path = %path.display(), %expiry, "Google token has expired");
    }
    file.token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| DeliverError::MissingToken(path.to_path_buf()))
}

/// Join `segments` onto `base`, percent-encoding each segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<reqwest::Url, DeliverError> {
    let mut url = reqwest::Url::parse(base).map_err(|e| DeliverError::Endpoint(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| DeliverError::Endpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx response into [`DeliverError::Server`].
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, DeliverError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(DeliverError::Server {
        status: status.as_u16(),
        body,
    })
}

/// Where a client finds its token.
#[derive(Debug, Clone)]
pub(crate) struct TokenSource(PathBuf);

impl TokenSource {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub(crate) fn access_token(&self) -> Result<String, DeliverError> {
        load_access_token(&self.0)
    }
}
