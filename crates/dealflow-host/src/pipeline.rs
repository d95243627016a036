//! One submission → memo → PDF, email, sheet row.
//!
//! The generator is the only stage that can abort a run. Once memo text
//! exists every extractor is total, and the delivery stages (PDF, email,
//! sheet) each record their failure and let the run continue, so a sheet row
//! is always attempted.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use dealflow_ai::{Generator, GeneratorError, build_prompt};
use dealflow_core::memo::{MemoAnalysis, analyze};
use dealflow_core::{DealRecord, Scorecard, Submission};
use dealflow_deliver::{EmailTransport, MemoRenderer, SheetTransport};

use crate::config::HostConfig;

pub const STATUS_SENT: &str = "Memo Sent";
pub const STATUS_REFUSED: &str = "Email Refused";
pub const STATUS_FAILED: &str = "Email Failed";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("generator stage failed: {0}")]
    Generator(#[from] GeneratorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Pdf,
    Email,
    Sheet,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Pdf => "pdf",
            Stage::Email => "email",
            Stage::Sheet => "sheet",
        })
    }
}

/// A delivery stage that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
    /// Deliberate no-op (e.g. no recipients) rather than an error.
    pub refusal: bool,
}

/// Result of a run that produced a memo.
#[derive(Debug, Clone, Serialize)]
pub struct DealOutcome {
    pub name: String,
    pub scorecard: Scorecard,
    pub record: DealRecord,
    pub pdf_path: Option<PathBuf>,
    pub message_id: Option<String>,
    pub failures: Vec<StageFailure>,
    pub completed_at: DateTime<Utc>,
}

impl DealOutcome {
    /// Every delivery stage succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, stage: Stage) -> Option<&StageFailure> {
        self.failures.iter().find(|f| f.stage == stage)
    }
}

/// `AcmeAI, Inc.` → `AcmeAI_Inc`; never empty.
pub fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '-' {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "Unnamed_Startup".to_string()
    } else {
        stem.to_string()
    }
}

pub struct DealPipeline {
    generator: Arc<dyn Generator>,
    renderer: Arc<dyn MemoRenderer>,
    email: Arc<dyn EmailTransport>,
    sheet: Arc<dyn SheetTransport>,
    output_dir: PathBuf,
    recipients: Vec<String>,
}

impl DealPipeline {
    pub fn new(
        config: &HostConfig,
        generator: Arc<dyn Generator>,
        renderer: Arc<dyn MemoRenderer>,
        email: Arc<dyn EmailTransport>,
        sheet: Arc<dyn SheetTransport>,
    ) -> Self {
        Self {
            generator,
            renderer,
            email,
            sheet,
            output_dir: config.output_dir.clone(),
            recipients: config.recipients.clone(),
        }
    }

    /// Run one submission end to end. The generator is called exactly once.
    pub async fn run(&self, sub: &Submission) -> Result<DealOutcome, PipelineError> {
        let name = sub.display_name().to_string();
        let prompt = build_prompt(sub);

        info!(name = %name, "generating memo");
        let raw = self.generator.generate(&prompt).await.inspect_err(|e| {
            error!(name = %name, error = %e, "memo generation failed");
        })?;

        let analysis = analyze(&raw, &prompt, sub);
        info!(
            name = %name,
            total = analysis.scorecard.total,
            verdict = %analysis.scorecard.verdict,
            method = ?analysis.parse_method,
            "memo scored"
        );

        let mut failures = Vec::new();
        let pdf_path = self.render_pdf(&name, &analysis, &mut failures).await;
        let (message_id, status) = self
            .send_email(&name, &analysis, pdf_path.as_deref(), &mut failures)
            .await;

        let record = analysis.to_record(&name, status);
        if let Err(e) = self.sheet.append(&record.to_row()).await {
            error!(name = %name, error = %e, "sheet append failed");
            failures.push(StageFailure {
                stage: Stage::Sheet,
                message: e.to_string(),
                refusal: false,
            });
        }

        info!(name = %name, failures = failures.len(), "deal processed");
        Ok(DealOutcome {
            name,
            scorecard: analysis.scorecard,
            record,
            pdf_path,
            message_id,
            failures,
            completed_at: Utc::now(),
        })
    }

    /// Layout and the file write are blocking work, so they run off the
    /// async worker threads.
    async fn render_pdf(
        &self,
        name: &str,
        analysis: &MemoAnalysis,
        failures: &mut Vec<StageFailure>,
    ) -> Option<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{}_DealMemo.pdf", file_stem(name)));
        let renderer = Arc::clone(&self.renderer);
        let text = analysis.halves.full.clone();
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&text, &path)).await;
        let message = match rendered {
            Ok(Ok(path)) => return Some(path),
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("render task did not finish: {e}"),
        };
        error!(name, error = %message, "PDF render failed");
        failures.push(StageFailure {
            stage: Stage::Pdf,
            message,
            refusal: false,
        });
        None
    }

    async fn send_email(
        &self,
        name: &str,
        analysis: &MemoAnalysis,
        attachment: Option<&std::path::Path>,
        failures: &mut Vec<StageFailure>,
    ) -> (Option<String>, &'static str) {
        let subject = format!("VC Deal Memo: {name}");
        let body = format!("{}\n\n{}", analysis.halves.mini, analysis.rationale);
        match self
            .email
            .send(&self.recipients, &subject, &body, attachment)
            .await
        {
            Ok(id) => (Some(id), STATUS_SENT),
            Err(e) if e.is_refusal() => {
                warn!(name, "memo email refused: no recipients configured");
                failures.push(StageFailure {
                    stage: Stage::Email,
                    message: e.to_string(),
                    refusal: true,
                });
                (None, STATUS_REFUSED)
            }
            Err(e) => {
                error!(name, error = %e, "memo email failed");
                failures.push(StageFailure {
                    stage: Stage::Email,
                    message: e.to_string(),
                    refusal: false,
                });
                (None, STATUS_FAILED)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use dealflow_core::Verdict;
    use pretty_assertions::assert_eq;

    const MEMO: &str = r#"Hi team,

AcmeAI automates legal intake with an AI copilot.

**Traction**
$150k MRR, 30% growth

```json
{"scores":{"team":20,"market":15,"product":8,"vision":4,"traction":7,"business_model":4,"moat":12,"risk_adj":-5,"bonus":2},"total":67,"verdict":"PASS"}
```

### FULL DEAL MEMO

# AcmeAI
Long form memo.
"#;

    struct Harness {
        generator: Arc<CannedGenerator>,
        renderer: Arc<RecordingRenderer>,
        email: Arc<RecordingEmail>,
        sheet: Arc<RecordingSheet>,
    }

    impl Harness {
        fn new(generator: CannedGenerator) -> Self {
            Self {
                generator: Arc::new(generator),
                renderer: Arc::new(RecordingRenderer::default()),
                email: Arc::new(RecordingEmail::new(false)),
                sheet: Arc::new(RecordingSheet::default()),
            }
        }

        fn pipeline(&self, recipients: &[&str]) -> DealPipeline {
            let config = HostConfig {
                output_dir: PathBuf::from("out"),
                recipients: recipients.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            };
            DealPipeline::new(
                &config,
                self.generator.clone(),
                self.renderer.clone(),
                self.email.clone(),
                self.sheet.clone(),
            )
        }
    }

    fn submission() -> Submission {
        Submission {
            name: "AcmeAI, Inc.".into(),
            round: "Seed".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn happy_path_delivers_everything() {
        let h = Harness::new(CannedGenerator::ok(MEMO));
        let outcome = h.pipeline(&["gp@example.com"]).run(&submission()).await.unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.scorecard.total, 71);
        assert_eq!(outcome.scorecard.verdict, Verdict::LearnMore);
        assert_eq!(outcome.message_id.as_deref(), Some("msg-1"));
        assert_eq!(
            outcome.pdf_path,
            Some(PathBuf::from("out/AcmeAI_Inc_DealMemo.pdf"))
        );

        let rendered = h.renderer.rendered.lock().unwrap();
        assert_eq!(rendered[0].0, "# AcmeAI\nLong form memo.");

        let sent = h.email.sent.lock().unwrap();
        let (to, subject, body, attachment) = &sent[0];
        assert_eq!(to, &vec!["gp@example.com".to_string()]);
        assert_eq!(subject, "VC Deal Memo: AcmeAI, Inc.");
        assert!(body.starts_with("Hi team,"));
        assert!(body.contains("**Score: 71/100 (Learn More)**"));
        assert_eq!(attachment.as_ref(), outcome.pdf_path.as_ref());

        let rows = h.sheet.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], outcome.record.to_row());
        assert_eq!(outcome.record.status, STATUS_SENT);
        assert_eq!(outcome.record.score, "71");
        assert_eq!(outcome.record.round, "Seed");
    }

    #[tokio::test]
    async fn generator_failure_aborts_before_delivery() {
        let h = Harness::new(CannedGenerator::failing());
        let err = h.pipeline(&["gp@example.com"]).run(&submission()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Generator(_)));
        assert_eq!(h.generator.calls.lock().unwrap().len(), 1);
        assert!(h.renderer.rendered.lock().unwrap().is_empty());
        assert!(h.sheet.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_recipients_is_a_refusal_and_row_still_logged() {
        let h = Harness::new(CannedGenerator::ok(MEMO));
        let outcome = h.pipeline(&[]).run(&submission()).await.unwrap();

        let failure = outcome.failure(Stage::Email).unwrap();
        assert!(failure.refusal);
        assert_eq!(outcome.record.status, STATUS_REFUSED);
        assert!(outcome.message_id.is_none());
        assert_eq!(h.sheet.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delivery_failures_do_not_stop_the_run() {
        let mut h = Harness::new(CannedGenerator::ok("unstructured prose"));
        h.renderer = Arc::new(RecordingRenderer {
            fail: true,
            ..Default::default()
        });
        h.email = Arc::new(RecordingEmail::new(true));
        let outcome = h.pipeline(&["gp@example.com"]).run(&submission()).await.unwrap();

        assert!(outcome.pdf_path.is_none());
        assert!(outcome.failure(Stage::Pdf).is_some());
        let email = outcome.failure(Stage::Email).unwrap();
        assert!(!email.refusal);
        assert_eq!(outcome.record.status, STATUS_FAILED);
        assert_eq!(outcome.scorecard.total, 0);
        assert_eq!(outcome.record.action, "Pass");
        assert_eq!(h.sheet.rows.lock().unwrap().len(), 1);
    }

    struct PanickingRenderer;

    impl MemoRenderer for PanickingRenderer {
        fn render(
            &self,
            _text: &str,
            _path: &std::path::Path,
        ) -> Result<PathBuf, dealflow_deliver::RenderError> {
            panic!("layout blew up");
        }
    }

    #[tokio::test]
    async fn renderer_runs_off_the_async_task() {
        let h = Harness::new(CannedGenerator::ok(MEMO));
        let pipeline = {
            let config = HostConfig {
                recipients: vec!["gp@example.com".into()],
                ..Default::default()
            };
            DealPipeline::new(
                &config,
                h.generator.clone(),
                Arc::new(PanickingRenderer),
                h.email.clone(),
                h.sheet.clone(),
            )
        };

        let outcome = pipeline.run(&submission()).await.unwrap();
        let failure = outcome.failure(Stage::Pdf).unwrap();
        assert!(failure.message.contains("render task did not finish"));
        assert!(outcome.pdf_path.is_none());
        let sent = h.email.sent.lock().unwrap();
        assert_eq!(sent[0].3, None);
        assert_eq!(h.sheet.rows.lock().unwrap().len(), 1);
    }

    #[test]
    fn file_stems_are_filesystem_safe() {
        assert_eq!(file_stem("AcmeAI"), "AcmeAI");
        assert_eq!(file_stem("Acme AI / Labs"), "Acme_AI_Labs");
        assert_eq!(file_stem("../../etc"), "etc");
        assert_eq!(file_stem("🚀"), "Unnamed_Startup");
    }
}
