//! HTTP intake: Typeform webhook, direct submissions, health.
//!
//! Handlers only map, deduplicate, and enqueue; the pipeline runs on the
//! worker, so the response acknowledges intake and says nothing about the
//! memo itself.

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

use dealflow_core::Submission;
use dealflow_core::field_map::{logical_name, logical_name_for_title};

use crate::dedup::SeenCache;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("payload has no form_response object")]
    MissingFormResponse,
}

#[derive(Clone)]
pub struct IntakeState {
    queue: mpsc::Sender<Submission>,
    seen: Arc<SeenCache>,
}

impl IntakeState {
    pub fn new(queue: mpsc::Sender<Submission>, seen: Arc<SeenCache>) -> Self {
        Self { queue, seen }
    }
}

pub fn router(state: IntakeState) -> Router {
    Router::new()
        .route("/webhook/typeform", post(typeform_webhook))
        .route("/submit", post(submit))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind and serve until the listener fails.
pub async fn serve(bind: SocketAddr, state: IntakeState) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "intake listening");
    axum::serve(listener, router(state)).await
}

// ── Typeform mapping ──

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Value keys tried, in order, when an answer's `type` is missing or does not
/// name a key that is present.
const VALUE_KEYS: &[&str] = &[
    "text",
    "email",
    "number",
    "url",
    "file_url",
    "date",
    "phone_number",
    "boolean",
];

fn choice_text(answer: &Value) -> Option<String> {
    answer
        .pointer("/choice/label")
        .or_else(|| answer.pointer("/choice/other"))
        .map(scalar_text)
}

fn choices_text(answer: &Value) -> Option<String> {
    let choices = answer.get("choices")?;
    let mut labels: Vec<String> = choices
        .get("labels")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(scalar_text)
        .collect();
    if let Some(other) = choices.get("other").and_then(Value::as_str) {
        labels.push(other.to_string());
    }
    Some(labels.join(", "))
}

/// Text of one Typeform answer. The value normally lives under a key named
/// after the answer `type`; choice answers carry labels instead. Untyped
/// answers fall back to the first [`VALUE_KEYS`] entry present.
fn answer_text(answer: &Value) -> String {
    let kind = answer.get("type").and_then(Value::as_str).unwrap_or_default();
    let typed = match kind {
        "choice" => choice_text(answer),
        "choices" => choices_text(answer),
        "" => None,
        _ => answer.get(kind).map(scalar_text),
    };
    typed
        .or_else(|| {
            VALUE_KEYS
                .iter()
                .find_map(|key| answer.get(*key).filter(|v| !v.is_null()))
                .map(scalar_text)
        })
        .or_else(|| choice_text(answer))
        .or_else(|| choices_text(answer))
        .unwrap_or_default()
}

/// Logical field for an answer: its field id through the id map, else its
/// question title through the title map.
fn answer_field(field_id: Option<&str>, title: Option<&str>) -> Option<&'static str> {
    field_id
        .and_then(logical_name)
        .or_else(|| title.and_then(logical_name_for_title))
}

/// Map a Typeform `form_response` webhook payload to a submission.
///
/// Answers are matched by field id, falling back to the question title. The
/// first answer for a field wins. Anything unmatched or repeated is kept under
/// `_unmapped`, keyed by field id, else by title, else by position. The submission id is the response token, falling
/// back to the delivery's `event_id`.
pub fn parse_typeform(payload: &Value) -> Result<Submission, IntakeError> {
    let form = payload
        .get("form_response")
        .and_then(Value::as_object)
        .ok_or(IntakeError::MissingFormResponse)?;

    let mut fields = Vec::new();
    let mut filled = HashSet::new();
    let mut unmapped = BTreeMap::new();
    for (index, answer) in form
        .get("answers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
    {
        let field_id = answer.pointer("/field/id").and_then(Value::as_str);
        let title = answer.pointer("/field/title").and_then(Value::as_str);
        let text = answer_text(answer);
        match answer_field(field_id, title) {
            Some(name) if filled.insert(name) => fields.push((name.to_string(), text)),
            _ => {
                let key = field_id
                    .or(title)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("answer_{index}"));
                unmapped.insert(key, text);
            }
        }
    }

    let mut sub = Submission::from_fields(fields);
    sub.unmapped.extend(unmapped);
    sub.id = form
        .get("token")
        .and_then(Value::as_str)
        .or_else(|| payload.get("event_id").and_then(Value::as_str))
        .map(str::to_string);
    Ok(sub)
}

// ── Handlers ──

type Reply = (StatusCode, Json<Value>);

fn enqueue(state: &IntakeState, sub: Submission) -> Reply {
    let name = sub.display_name().to_string();
    let id = sub.id.clone();
    if let Some(id) = id.as_deref()
        && !state.seen.check_and_insert(id)
    {
        info!(id, name = %name, "duplicate submission ignored");
        return (StatusCode::OK, Json(json!({ "status": "duplicate", "id": id })));
    }

    match state.queue.try_send(sub) {
        Ok(()) => {
            info!(id = id.as_deref().unwrap_or("-"), name = %name, "submission accepted");
            (
                StatusCode::ACCEPTED,
                Json(json!({ "status": "accepted", "name": name })),
            )
        }
        Err(e) => {
            if let Some(id) = id.as_deref() {
                state.seen.forget(id);
            }
            let status = match e {
                TrySendError::Full(_) => "busy",
                TrySendError::Closed(_) => "unavailable",
            };
            warn!(name = %name, status, "submission not queued");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": status })),
            )
        }
    }
}

async fn typeform_webhook(State(state): State<IntakeState>, Json(payload): Json<Value>) -> Reply {
    match parse_typeform(&payload) {
        Ok(sub) => enqueue(&state, sub),
        Err(e) => {
            warn!(error = %e, "rejected webhook payload");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

async fn submit(State(state): State<IntakeState>, Json(sub): Json<Submission>) -> Reply {
    enqueue(&state, sub)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
