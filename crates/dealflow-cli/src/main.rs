mod display;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dealflow_ai::{AssistantClient, DEFAULT_BASE_URL};
use dealflow_core::Submission;
use dealflow_deliver::google::{GMAIL_BASE_URL, SHEETS_BASE_URL};
use dealflow_deliver::{GmailClient, PdfRenderer, SheetsClient};
use dealflow_host::{
    DealPipeline, HostConfig, IntakeState, SeenCache, parse_recipients, parse_typeform,
    spawn_worker,
};

#[derive(Parser)]
#[command(name = "dealflow", version, about = "Startup pitch → deal memo pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the intake server and background worker.
    Serve {
        #[command(flatten)]
        service: ServiceArgs,
        #[arg(long, env = "DEALFLOW_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
        #[arg(long, env = "DEALFLOW_DEDUP_TTL_SECS", default_value_t = 600)]
        dedup_ttl_secs: u64,
        #[arg(long, default_value_t = 64)]
        queue_capacity: usize,
    },
    /// Run one submission (Typeform payload or plain JSON) in the foreground.
    Process {
        payload: PathBuf,
        #[command(flatten)]
        service: ServiceArgs,
    },
    /// Extract signals from a saved memo without calling any service.
    Analyze {
        memo: PathBuf,
        /// Prompt the memo was generated from (scanned for the round).
        #[arg(long)]
        prompt: Option<PathBuf>,
        /// Print the full analysis as JSON instead of a card.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ServiceArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,
    #[arg(long, env = "OPENAI_ASSISTANT_ID")]
    assistant_id: String,
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    openai_base_url: String,
    #[arg(long, env = "DEALFLOW_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,
    #[arg(long, env = "GOOGLE_TOKEN_PATH", default_value = "token.json")]
    google_token_path: PathBuf,
    #[arg(long, env = "GMAIL_SENDER")]
    gmail_sender: String,
    #[arg(long, env = "SPREADSHEET_ID")]
    spreadsheet_id: String,
    #[arg(long, env = "SHEET_RANGE", default_value = "Sheet1!A1")]
    sheet_range: String,
    /// Comma-separated memo recipients. Empty refuses every email.
    #[arg(long, env = "GP_RECIPIENTS", default_value = "")]
    gp_recipients: String,
    #[arg(long, env = "DEALFLOW_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,
}

impl ServiceArgs {
    fn host_config(&self) -> HostConfig {
        HostConfig {
            output_dir: self.output_dir.clone(),
            recipients: parse_recipients(&self.gp_recipients),
            ..Default::default()
        }
    }

    fn pipeline(&self, config: &HostConfig) -> DealPipeline {
        let generator = AssistantClient::new(
            &self.openai_base_url,
            self.openai_api_key.clone(),
            self.assistant_id.clone(),
        )
        .with_poll_interval(Duration::from_millis(self.poll_interval_ms));
        let email = GmailClient::new(
            GMAIL_BASE_URL,
            self.google_token_path.clone(),
            self.gmail_sender.clone(),
        );
        let sheet = SheetsClient::new(
            SHEETS_BASE_URL,
            self.google_token_path.clone(),
            self.spreadsheet_id.clone(),
            self.sheet_range.clone(),
        );
        DealPipeline::new(
            config,
            Arc::new(generator),
            Arc::new(PdfRenderer),
            Arc::new(email),
            Arc::new(sheet),
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            service,
            bind,
            dedup_ttl_secs,
            queue_capacity,
        } => {
            let config = HostConfig {
                bind,
                dedup_ttl: Duration::from_secs(dedup_ttl_secs),
                queue_capacity,
                ..service.host_config()
            };
            if config.recipients.is_empty() {
                tracing::warn!("GP_RECIPIENTS is empty; memo emails will be refused");
            }
            info!("dealflow v{}", env!("CARGO_PKG_VERSION"));
            let pipeline = Arc::new(service.pipeline(&config));
            let (queue, _worker) = spawn_worker(pipeline, config.queue_capacity);
            let seen = Arc::new(SeenCache::new(config.dedup_ttl));
            dealflow_host::serve(config.bind, IntakeState::new(queue, seen))
                .await
                .with_context(|| format!("intake server on {}", config.bind))?;
        }
        Command::Process { payload, service } => {
            let raw = std::fs::read_to_string(&payload)
                .with_context(|| format!("read {}", payload.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("payload is not JSON")?;
            let sub = if value.get("form_response").is_some() {
                parse_typeform(&value)?
            } else {
                serde_json::from_value::<Submission>(value).context("payload is not a submission")?
            };
            let config = service.host_config();
            let outcome = service.pipeline(&config).run(&sub).await?;
            display::print_outcome(&outcome);
        }
        Command::Analyze { memo, prompt, json } => {
            let raw = std::fs::read_to_string(&memo)
                .with_context(|| format!("read {}", memo.display()))?;
            let prompt = match prompt {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?,
                None => String::new(),
            };
            let analysis = dealflow_core::analyze(&raw, &prompt, &Submission::default());
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                display::print_analysis_card(&analysis);
            }
        }
    }
    Ok(())
}
