use std::fmt::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{TokenSource, check_status, endpoint};
use crate::error::DeliverError;
use crate::transport::EmailTransport;

pub const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Base64 body lines are wrapped at this width (RFC 2045).
const MIME_LINE: usize = 76;

pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
    token: TokenSource,
    sender: String,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

/// Collapse a header value onto one line. Control characters (CR and LF
/// among them) become spaces so a value can never start a new header.
fn single_line(value: &str) -> String {
    value
        .split(|c: char| c.is_control() || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One-line header value, in encoded-word form when it is not plain ASCII.
fn header_value(value: &str) -> String {
    let value = single_line(value);
    if value.is_ascii() {
        value
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}

/// Attachment name safe to place inside a quoted MIME parameter.
fn attachment_name(filename: &str) -> String {
    let name = single_line(filename).replace(['"', '\\'], "_");
    if name.is_empty() {
        "memo.pdf".to_string()
    } else {
        header_value(&name)
    }
}

/// Build a `multipart/mixed` message: a UTF-8 text part plus an optional
/// base64 attachment named after the file.
///
/// Every header value is folded onto a single line first.
pub fn build_mime(
    from: &str,
    to: &[String],
    subject: &str,
    body: &str,
    attachment: Option<(&str, &[u8])>,
) -> String {
    let now = Utc::now();
    let boundary = format!("dealflow-{}", now.timestamp_nanos_opt().unwrap_or_default());

    let to = to
        .iter()
        .map(|addr| single_line(addr.as_str()))
        .filter(|addr| !addr.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let mut msg = String::new();
    let _ = write!(
        msg,
        "From: {}\r\nTo: {to}\r\nSubject: {}\r\nDate: {}\r\nMIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n",
        single_line(from),
        header_value(subject),
        now.to_rfc2822(),
    );
    let _ = write!(
        msg,
        "--{boundary}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\
         Content-Transfer-Encoding: 8bit\r\n\r\n{}\r\n",
        body.replace("\r\n", "\n").replace('\n', "\r\n"),
    );
    if let Some((filename, bytes)) = attachment {
        let filename = attachment_name(filename);
        let encoded = STANDARD.encode(bytes);
        let _ = write!(
            msg,
            "--{boundary}\r\nContent-Type: application/pdf; name=\"{filename}\"\r\n\
             Content-Disposition: attachment; filename=\"{filename}\"\r\n\
             Content-Transfer-Encoding: base64\r\n\r\n",
        );
        for chunk in encoded.as_bytes().chunks(MIME_LINE) {
            msg.push_str(&String::from_utf8_lossy(chunk));
            msg.push_str("\r\n");
        }
    }
    let _ = write!(msg, "--{boundary}--\r\n");
    msg
}

impl GmailClient {
    /// `base_url` is like [`GMAIL_BASE_URL`]; `sender` goes in the `From` header.
    pub fn new(base_url: &str, token_path: impl Into<PathBuf>, sender: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: TokenSource::new(token_path),
            sender,
        }
    }
}

#[async_trait]
impl EmailTransport for GmailClient {
    async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<String, DeliverError> {
        if to.is_empty() {
            warn!(subject, "no recipients configured; email not sent");
            return Err(DeliverError::NoRecipients);
        }

        let file = match attachment {
            Some(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "memo.pdf".to_string());
                Some((name, tokio::fs::read(path).await?))
            }
            None => None,
        };
        let mime = build_mime(
            &self.sender,
            to,
            subject,
            body,
            file.as_ref().map(|(n, b)| (n.as_str(), b.as_slice())),
        );

        let token = self.token.access_token()?;
        let url = endpoint(&self.base_url, &["users", "me", "messages", "send"])?;
        info!(recipients = to.len(), subject, "sending memo email");
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "raw": URL_SAFE.encode(mime) }))
            .send()
            .await?;
        let sent: SendResponse = check_status(resp).await?.json().await?;
        info!(message_id = %sent.id, "memo email sent");
        Ok(sent.id)
    }
}
