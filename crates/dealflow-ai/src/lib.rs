//! Memo generation: prompt building and the hosted assistant client.
//!
//! The pipeline only sees the [`Generator`] trait; the OpenAI Assistants
//! backend is gated behind the `openai` feature.

mod generator;
pub mod prompt;

#[cfg(feature = "openai")]
mod assistant;

#[cfg(feature = "openai")]
pub use assistant::{AssistantClient, DEFAULT_BASE_URL};
pub use generator::{Generator, GeneratorError};
pub use prompt::build_prompt;
