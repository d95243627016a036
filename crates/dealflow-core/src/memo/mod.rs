//! Memo extraction engine.
//!
//! Turns free-form assistant output into the structured signals the pipeline
//! logs: sections, a calibrated scorecard, revenue, round, tags, summary, and
//! rationale. Every function here is total; misses surface as [`UNKNOWN`],
//! [`NO_ROUND`], or an empty default, never as an error.

pub mod calibrate;
pub mod scorecard;
pub mod sections;
pub mod signals;
pub mod split;
pub mod tags;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::deal::{DealRecord, Submission};
use crate::schema::sheet;

pub use calibrate::{calibrate, max_mrr};
pub use scorecard::{
    ParseMethod, ScoreCategory, Scorecard, Verdict, parse_score_any, parse_score_with_method,
};
pub use sections::{ExtractedField, Section, UNKNOWN, extract_field, extract_section};
pub use signals::{NO_ROUND, build_rationale, extract_revenue, extract_round, extract_summary};
pub use split::{FULL_MEMO_DELIMITER, MemoHalves, split};
pub use tags::infer_tags;

/// Compile a pattern that is a literal in this crate.
fn static_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => panic!("invalid built-in pattern `{pattern}`: {err}"),
    }
}

/// Everything extracted from one memo.
#[derive(Debug, Clone, Serialize)]
pub struct MemoAnalysis {
    pub halves: MemoHalves,
    /// Scorecard as the assistant wrote it, if any strategy recovered one.
    pub raw_scorecard: Option<Scorecard>,
    pub parse_method: Option<ParseMethod>,
    /// Calibrated scorecard; authoritative downstream.
    pub scorecard: Scorecard,
    pub summary: String,
    pub traction: String,
    pub team: String,
    pub revenue: String,
    pub round: String,
    pub tags: Vec<String>,
    pub mrr: Option<u64>,
    pub rationale: String,
}

/// Section text from the mini half, falling back to the full half.
fn section_from_either(section: Section, halves: &MemoHalves) -> String {
    extract_section(section, &halves.mini)
        .or_else(|| extract_section(section, &halves.full))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Run the whole extraction chain over raw assistant output.
///
/// `prompt` is the text the assistant was given (scanned for the round);
/// `submission` supplies the form fields used for tag inference and as a
/// revenue fallback.
pub fn analyze(raw: &str, prompt: &str, submission: &Submission) -> MemoAnalysis {
    let halves = split(raw);
    if !halves.delimited {
        debug!("memo has no delimiter line; using it whole for both halves");
    }

    let traction = section_from_either(Section::Traction, &halves);
    let team = section_from_either(Section::Team, &halves);
    let mut revenue = extract_revenue(&traction);
    if revenue == UNKNOWN {
        revenue = extract_revenue(&submission.traction);
    }
    let round = extract_round(prompt);
    let summary = extract_summary(&halves.mini);

    let parsed = parse_score_with_method(&halves.mini, &halves.full);
    let (raw_scorecard, parse_method) = match parsed {
        Some((sc, method)) => (Some(sc), Some(method)),
        None => (None, None),
    };
    let scorecard = calibrate(&halves.mini, &raw_scorecard.clone().unwrap_or_default());

    let mrr = extract_section(Section::Traction, &halves.mini)
        .as_deref()
        .and_then(max_mrr);
    let rationale = build_rationale(&scorecard, mrr);

    let tags = infer_tags(
        raw,
        &[
            &submission.industry,
            submission.product_line(),
            &submission.problem,
            &submission.market,
        ],
        &submission.round,
    );

    MemoAnalysis {
        halves,
        raw_scorecard,
        parse_method,
        scorecard,
        summary,
        traction,
        team,
        revenue,
        round,
        tags,
        mrr,
        rationale,
    }
}

impl MemoAnalysis {
    /// Build the tracking-sheet row.
    ///
    /// `status` reports how delivery went; it is the only column not derived
    /// from the memo itself.
    pub fn to_record(&self, name: &str, status: &str) -> DealRecord {
        let reason = self
            .rationale
            .lines()
            .filter_map(|l| l.trim().strip_prefix("- "))
            .collect::<Vec<_>>()
            .join(" ");
        DealRecord {
            name: name.to_string(),
            summary: sheet::cell(&self.summary, sheet::MAX_SUMMARY_CHARS),
            traction: sheet::cell(&self.traction, sheet::MAX_SUMMARY_CHARS),
            revenue: self.revenue.clone(),
            team: sheet::cell(&self.team, sheet::MAX_SUMMARY_CHARS),
            round: self.round.clone(),
            tags: self.tags.join(", "),
            score: self.scorecard.total.to_string(),
            status: status.to_string(),
            action: self.scorecard.verdict.human_label().to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RAW: &str = r#"Hi team,

AcmeAI is an AI assistant that automates legal intake; worth a look.

**Traction**
$150k MRR, 30% growth

**Team**
2 ex-Google engineers

```json
{"scores":{"team":20,"market":15,"product":8,"vision":4,"traction":7,"business_model":4,"moat":12,"risk_adj":-5,"bonus":2},"total":67,"verdict":"PASS"}
```

### FULL DEAL MEMO

# AcmeAI Deal Memo

## Moat
Proprietary dataset from 50k legal documents.
"#;

    fn submission() -> Submission {
        Submission {
            name: "AcmeAI".into(),
            round: "Seed".into(),
            industry: "AI SaaS / LegalTech".into(),
            traction: "20k MRR".into(),
            ..Default::default()
        }
    }

    #[test]
    fn analyze_end_to_end() {
        let prompt = "Startup: AcmeAI\nStage: Seed\n";
        let a = analyze(RAW, prompt, &submission());

        assert_eq!(a.parse_method, Some(ParseMethod::FencedBlock));
        assert_eq!(a.raw_scorecard.as_ref().map(|s| s.total), Some(67));
        assert_eq!(a.scorecard.total, 71);
        assert_eq!(a.scorecard.verdict, Verdict::LearnMore);
        assert_eq!(a.traction, "$150k MRR, 30% growth");
        assert_eq!(a.team.lines().next(), Some("2 ex-Google engineers"));
        assert_eq!(a.revenue, "$150k MRR");
        assert_eq!(a.round, "Seed");
        assert_eq!(a.mrr, Some(150_000));
        assert_eq!(
            a.summary,
            "AcmeAI is an AI assistant that automates legal intake; worth a look."
        );
        assert_eq!(a.tags[0], "AI");
        assert!(a.tags.contains(&"LegalTech".to_string()));
        assert_eq!(a.tags.last().map(String::as_str), Some("Seed"));
    }

    #[test]
    fn moat_in_full_half_does_not_nudge_calibration() {
        // Calibration reads the mini half only.
        let a = analyze(RAW, "", &submission());
        assert_eq!(a.scorecard.score(ScoreCategory::Moat), 12);
    }

    #[test]
    fn prose_memo_still_produces_a_record() {
        let a = analyze("The founders seem sharp.", "", &Submission::default());
        assert!(a.raw_scorecard.is_none());
        assert_eq!(a.scorecard.total, 0);
        assert_eq!(a.scorecard.verdict, Verdict::Pass);
        assert_eq!(a.traction, UNKNOWN);
        assert_eq!(a.revenue, UNKNOWN);
        assert_eq!(a.round, NO_ROUND);

        let record = a.to_record("Unnamed Startup", "Memo Sent");
        assert_eq!(record.score, "0");
        assert_eq!(record.action, "Pass");
        assert_eq!(record.to_row().len(), 11);
    }

    #[test]
    fn revenue_falls_back_to_submission_traction() {
        let raw = "Hi team,\nshort\n**Traction**\nGrowing fast\n";
        let sub = Submission {
            traction: "We have 40 paying customers".into(),
            ..Default::default()
        };
        let a = analyze(raw, "", &sub);
        assert_eq!(a.traction, "Growing fast");
        assert_eq!(a.revenue, "40 paying customers");
    }

    #[test]
    fn record_flattens_reason_bullets() {
        let a = analyze(RAW, "Stage: Seed", &submission());
        let record = a.to_record("AcmeAI", "Memo Sent");
        assert_eq!(record.score, "71");
        assert_eq!(record.action, "Learn More");
        assert!(record.reason.starts_with("Weak moat (12/20)"));
        assert!(!record.reason.contains('\n'));
        assert_eq!(record.status, "Memo Sent");
    }
}
