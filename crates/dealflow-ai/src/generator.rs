use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[cfg(feature = "openai")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant API returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("assistant run {run_id} ended with status `{status}`")]
    RunFailed { run_id: String, status: String },
    #[error("assistant returned no text")]
    EmptyResponse,
}

/// Something that turns a prompt into a raw deal memo.
///
/// Implementations block until the memo is complete. Callers never retry.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}
