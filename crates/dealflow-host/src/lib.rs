//! Deal pipeline host: orchestration, intake server, dedup cache, worker.

pub mod config;
pub mod dedup;
pub mod intake;
pub mod pipeline;
pub mod worker;

pub use config::{HostConfig, parse_recipients};
pub use dedup::SeenCache;
pub use intake::{IntakeState, parse_typeform, router, serve};
pub use pipeline::{DealOutcome, DealPipeline, PipelineError, Stage, StageFailure};
pub use worker::spawn_worker;
