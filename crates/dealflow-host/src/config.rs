use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings for the pipeline, intake server, and worker.
///
/// Built by the binary from environment/flags; library code never reads the
/// environment itself.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Directory memo PDFs are written to.
    pub output_dir: PathBuf,
    /// Memo email recipients. Empty means every email is refused.
    pub recipients: Vec<String>,
    pub bind: SocketAddr,
    /// How long a submission id is remembered for deduplication.
    pub dedup_ttl: Duration,
    /// Bound on submissions waiting for the worker.
    pub queue_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            recipients: Vec::new(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            dedup_ttl: Duration::from_secs(600),
            queue_capacity: 64,
        }
    }
}

/// Split a comma-separated recipient list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
