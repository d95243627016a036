//! Vertical card display for memo analyses and pipeline outcomes.

use dealflow_core::memo::{MemoAnalysis, ScoreCategory, Scorecard};
use dealflow_host::DealOutcome;

const MAX_LIST_ITEMS: usize = 10;
const MAX_CELL_CHARS: usize = 120;

// ── Public API ──

/// Print the signals extracted from one memo, grouped by concern.
pub fn print_analysis_card(analysis: &MemoAnalysis) {
    println!("=== Memo analysis ===");
    println!();

    println!("Signals");
    row("Summary", &clip(&analysis.summary));
    row("Traction", &clip(&analysis.traction));
    row("Team", &clip(&analysis.team));
    row("Revenue", &analysis.revenue);
    row("Round", &analysis.round);
    list_row("Tags", &analysis.tags);
    if let Some(mrr) = analysis.mrr {
        row("MRR", &mrr.to_string());
    }
    println!();

    let method = match analysis.parse_method {
        Some(m) => format!("{m:?}"),
        None => "none (defaulted to zero)".to_string(),
    };
    println!("Scorecard");
    row("Parsed from", &method);
    if let Some(raw) = &analysis.raw_scorecard {
        row("Raw total", &format!("{} ({})", raw.total, raw.verdict));
    }
    print_scores(&analysis.scorecard, analysis.raw_scorecard.as_ref());
    println!();

    println!("Rationale");
    for line in analysis.rationale.lines() {
        println!("  {line}");
    }
    println!();

    println!("Memo");
    if !analysis.halves.delimited {
        row("Delimiter", "missing (both halves are the whole memo)");
    }
    row("Email half", &format!("{} chars", analysis.halves.mini.chars().count()));
    row("Document half", &format!("{} chars", analysis.halves.full.chars().count()));
}

/// Print the result of one pipeline run.
pub fn print_outcome(outcome: &DealOutcome) {
    println!("=== {} ===", outcome.name);
    println!();

    println!("Decision");
    row(
        "Score",
        &format!("{}/100 ({})", outcome.scorecard.total, outcome.record.action),
    );
    row("Reason", &clip(&outcome.record.reason));
    println!();

    println!("Delivery");
    row(
        "PDF",
        &outcome
            .pdf_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    row("Email", &outcome.record.status);
    if let Some(id) = &outcome.message_id {
        row("Message id", id);
    }
    row("Completed", &outcome.completed_at.to_rfc3339());
    for failure in &outcome.failures {
        let kind = if failure.refusal { "refused" } else { "failed" };
        row(&format!("{} {kind}", failure.stage), &clip(&failure.message));
    }
    println!();

    println!("Sheet row");
    for (column, value) in dealflow_core::DEAL_RECORD_COLUMNS
        .iter()
        .zip(outcome.record.to_row())
    {
        row(column, &clip(&value));
    }
}

// ── Rows ──

fn row(label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    println!("  {:<26} {}", label, value);
}

fn list_row(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let shown: Vec<&str> = items.iter().take(MAX_LIST_ITEMS).map(String::as_str).collect();
    let more = items.len().saturating_sub(MAX_LIST_ITEMS);
    if more > 0 {
        row(label, &format!("{} (+{more} more)", shown.join(", ")));
    } else {
        row(label, &shown.join(", "));
    }
}

fn print_scores(calibrated: &Scorecard, raw: Option<&Scorecard>) {
    for category in ScoreCategory::ALL {
        let (min, max) = category.range();
        let value = calibrated.score(category);
        let changed = raw
            .map(|r| r.score(category))
            .filter(|&before| before != value)
            .map(|before| format!("  (was {before})"))
            .unwrap_or_default();
        println!("  {:<26} {value:>3}  [{min}..{max}]{changed}", category.key());
    }
    println!(
        "  {:<26} {} ({})",
        "total", calibrated.total, calibrated.verdict
    );
}

/// `text` with whitespace flattened, shortened for a single card row.
fn clip(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_CELL_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(MAX_CELL_CHARS).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_flattens_and_shortens() {
        assert_eq!(clip("a\n  b"), "a b");
        let long = "x".repeat(200);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), MAX_CELL_CHARS + 3);
        assert!(clipped.ends_with("..."));
    }
}
