//! OpenAI Assistants (v2) client.
//!
//! One memo is one thread: post the prompt as a user message, start a run
//! against the configured assistant, poll the run until it settles, then read
//! the newest assistant message back.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::generator::{Generator, GeneratorError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Run states after which polling stops without a memo. `requires_action`
/// waits on tool outputs this client never submits.
const FAILED_RUN_STATES: &[&str] = &[
    "failed",
    "cancelled",
    "expired",
    "incomplete",
    "requires_action",
];

pub struct AssistantClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    assistant_id: String,
    poll_interval: Duration,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct Run {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<Message>,
}

#[derive(Deserialize)]
struct Message {
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    value: String,
}

impl AssistantClient {
    /// `base_url` is like `https://api.openai.com/v1` (trailing slash ignored).
    pub fn new(base_url: &str, api_key: String, assistant_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            assistant_id,
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, GeneratorError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeneratorError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<(), GeneratorError> {
        let path = format!("/threads/{thread_id}/runs/{run_id}");
        loop {
            let run: Run = self.send(self.request(reqwest::Method::GET, &path)).await?;
            match run.status.as_str() {
                "completed" => return Ok(()),
                s if FAILED_RUN_STATES.contains(&s) => {
                    return Err(GeneratorError::RunFailed {
                        run_id: run.id,
                        status: run.status,
                    });
                }
                s => {
                    debug!(run_id, status = s, "run still in progress");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl Generator for AssistantClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let thread: Created = self
            .send(self.request(reqwest::Method::POST, "/threads").json(&json!({})))
            .await?;
        let messages_path = format!("/threads/{}/messages", thread.id);
        let _: Created = self
            .send(
                self.request(reqwest::Method::POST, &messages_path)
                    .json(&json!({ "role": "user", "content": prompt })),
            )
            .await?;

        let run: Run = self
            .send(
                self.request(reqwest::Method::POST, &format!("/threads/{}/runs", thread.id))
                    .json(&json!({ "assistant_id": self.assistant_id })),
            )
            .await?;
        info!(thread_id = %thread.id, run_id = %run.id, "assistant run started");
        self.wait_for_run(&thread.id, &run.id).await?;

        let list: MessageList = self
            .send(
                self.request(reqwest::Method::GET, &messages_path)
                    .query(&[("order", "desc")]),
            )
            .await?;
        let text = list
            .data
            .into_iter()
            .find(|m| m.role == "assistant")
            .map(|m| {
                m.content
                    .into_iter()
                    .filter_map(|part| part.text.map(|t| t.value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        info!(thread_id = %thread.id, chars = text.len(), "assistant memo received");
        Ok(text)
    }
}
