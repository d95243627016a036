//! Background worker: drains the intake queue, one pipeline task per job.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use dealflow_core::Submission;

use crate::pipeline::DealPipeline;

/// Start the worker. Returns the queue sender handed to the intake server and
/// the worker handle, which finishes once every sender is dropped and the
/// queue is drained.
pub fn spawn_worker(
    pipeline: Arc<DealPipeline>,
    capacity: usize,
) -> (mpsc::Sender<Submission>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(drain(pipeline, rx));
    (tx, handle)
}

async fn drain(pipeline: Arc<DealPipeline>, mut rx: mpsc::Receiver<Submission>) {
    let mut runs = tokio::task::JoinSet::new();
    while let Some(sub) = rx.recv().await {
        let pipeline = Arc::clone(&pipeline);
        runs.spawn(async move { process(&pipeline, &sub).await });
        // Reap finished runs so the set does not grow unbounded.
        while runs.try_join_next().is_some() {}
    }
    while runs.join_next().await.is_some() {}
    info!("intake queue closed; worker stopped");
}

async fn process(pipeline: &DealPipeline, sub: &Submission) {
    let name = sub.display_name();
    match pipeline.run(sub).await {
        Ok(outcome) if outcome.is_clean() => {
            info!(name, total = outcome.scorecard.total, "deal delivered");
        }
        Ok(outcome) => {
            for failure in &outcome.failures {
                warn!(
                    name,
                    stage = %failure.stage,
                    refusal = failure.refusal,
                    error = %failure.message,
                    "deal delivered with a failed stage"
                );
            }
        }
        Err(e) => error!(name, error = %e, "deal pipeline aborted"),
    }
}
