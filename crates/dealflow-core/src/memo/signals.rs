//! Small independent extractors: revenue, round, rationale, executive summary.
//!
//! Each one is total: a miss yields a sentinel (`Unknown`, `N/A`) or a
//! synthesised fallback, never an error.

use std::sync::LazyLock;

use regex::Regex;

use super::UNKNOWN;
use super::calibrate::STRONG_MRR;
use super::scorecard::{ScoreCategory, Scorecard};
use super::sections::{Section, extract_field, first_header_offset};
use super::static_regex;

// ── Revenue ──

static REVENUE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        static_regex(r"(?i)\$\s?\d[\d,]*(?:\.\d+)?\s*[km]?\b(?:\s*(?:ARR|MRR)\b)?"),
        static_regex(r"(?i)\b\d[\d,]*\+?\s*(?:users|customers|clients)\b"),
        static_regex(r"(?i)\b\d[\d,]*\s+paying\s+(?:customers|subscriptions|subscribers|subs)\b"),
    ]
});

/// First revenue-like figure in `traction`, or `Unknown`.
///
/// Patterns are tried in order (dollar figure, user/customer count, paying
/// customer count) and the first one that matches anywhere wins.
pub fn extract_revenue(traction: &str) -> String {
    REVENUE_PATTERNS
        .iter()
        .find_map(|re| re.find(traction))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

// ── Round ──

/// Round labels in match priority. `Pre-Seed` precedes `Seed` so it is not
/// shadowed by its own substring.
pub const ROUND_TAGS: &[&str] = &["Pre-Seed", "Seed", "Series A", "Series B"];

/// Sentinel for prompts that name no round.
pub const NO_ROUND: &str = "N/A";

/// First [`ROUND_TAGS`] entry occurring in `prompt` (case-insensitive).
pub fn extract_round(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    ROUND_TAGS
        .iter()
        .find(|tag| lower.contains(&tag.to_lowercase()))
        .map(|tag| tag.to_string())
        .unwrap_or_else(|| NO_ROUND.to_string())
}

// ── Rationale ──

const MAX_REASONS: usize = 4;
const WEAK_MOAT_BELOW: i32 = 15;
const RISK_PENALTY_AT: i32 = -3;
const UNCLEAR_MODEL_BELOW: i32 = 4;

/// Markdown rationale: a score headline plus up to four reason bullets.
///
/// `mrr` is the strongest MRR figure found in the traction section, if any.
pub fn build_rationale(scorecard: &Scorecard, mrr: Option<u64>) -> String {
    let moat = scorecard.score(ScoreCategory::Moat);
    let risk = scorecard.score(ScoreCategory::RiskAdj);
    let model = scorecard.score(ScoreCategory::BusinessModel);

    let mut reasons = Vec::new();
    if moat < WEAK_MOAT_BELOW {
        reasons.push(format!(
            "- Weak moat ({moat}/20): defensibility is not yet proven."
        ));
    }
    if risk <= RISK_PENALTY_AT {
        reasons.push(format!(
            "- Material risk penalty ({risk}): key execution or market risks remain open."
        ));
    }
    if model < UNCLEAR_MODEL_BELOW {
        reasons.push(format!(
            "- Business model unclear ({model}/5): pricing and monetization need validation."
        ));
    }
    if let Some(mrr) = mrr
        && mrr >= STRONG_MRR
    {
        reasons.push(format!(
            "- Strong MRR ({}): revenue traction supports the raise.",
            format_money(mrr)
        ));
    }
    reasons.truncate(MAX_REASONS);
    if reasons.is_empty() {
        reasons.push("- Balanced profile: no single factor dominates the decision.".to_string());
    }

    format!(
        "**Score: {}/100 ({})**\n{}",
        scorecard.total,
        scorecard.verdict.human_label(),
        reasons.join("\n")
    )
}

/// `150000` → `$150k`, `1200000` → `$1.2M`.
fn format_money(amount: u64) -> String {
    if amount >= 1_000_000 {
        let millions = amount as f64 / 1_000_000.0;
        let text = format!("{millions:.1}");
        format!("${}M", text.trim_end_matches(".0"))
    } else if amount >= 1_000 {
        format!("${}k", amount / 1_000)
    } else {
        format!("${amount}")
    }
}

// ── Executive summary ──

/// Opening line of the email half; the summary follows it.
pub const GREETING: &str = "Hi team,";

/// Text between [`GREETING`] and the first section header.
///
/// Falls back to a one-line summary stitched from the overview, solution, and
/// traction sections when the greeting is missing or nothing follows it.
pub fn extract_summary(mini: &str) -> String {
    greeting_block(mini)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| synthesized_summary(mini))
}

fn greeting_block(mini: &str) -> Option<String> {
    let at = mini.char_indices().map(|(i, _)| i).find(|&i| {
        mini.get(i..i + GREETING.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(GREETING))
    })?;
    let rest = &mini[at + GREETING.len()..];
    let end = first_header_offset(rest).unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn synthesized_summary(mini: &str) -> String {
    let overview = extract_field(Section::StartupOverview, mini);
    let solution = extract_field(Section::Solution, mini);
    let traction = extract_field(Section::Traction, mini);
    let line = format!("{overview}. Solution: {solution}. Traction: {traction}.");
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::scorecard::Verdict;

    #[test]
    fn revenue_dollar_figure() {
        assert_eq!(extract_revenue("We're at $120k MRR and growing"), "$120k MRR");
        assert_eq!(extract_revenue("ARR of $1.5M ARR"), "$1.5M ARR");
        assert_eq!(extract_revenue("raised $500k"), "$500k");
    }

    #[test]
    fn revenue_customer_counts() {
        assert_eq!(extract_revenue("50 paying customers"), "50 paying customers");
        assert_eq!(extract_revenue("over 1,200 users on the waitlist"), "1,200 users");
        assert_eq!(extract_revenue("300 paying subs"), "300 paying subs");
    }

    #[test]
    fn revenue_dollar_beats_counts() {
        assert_eq!(extract_revenue("40 customers, $20k MRR"), "$20k MRR");
    }

    #[test]
    fn revenue_miss_is_unknown() {
        assert_eq!(extract_revenue("doing great"), UNKNOWN);
        assert_eq!(extract_revenue(""), UNKNOWN);
    }

    #[test]
    fn round_detection() {
        assert_eq!(extract_round("We are raising a Series A round of $8M"), "Series A");
        assert_eq!(extract_round("Stage: pre-seed"), "Pre-Seed");
        assert_eq!(extract_round("Stage: SEED"), "Seed");
        assert_eq!(extract_round("Bootstrapped so far"), NO_ROUND);
    }

    fn card(moat: i32, risk: i32, model: i32, total: i32, verdict: Verdict) -> Scorecard {
        let mut sc = Scorecard {
            total,
            verdict,
            ..Default::default()
        };
        sc.scores.insert(ScoreCategory::Moat, moat);
        sc.scores.insert(ScoreCategory::RiskAdj, risk);
        sc.scores.insert(ScoreCategory::BusinessModel, model);
        sc
    }

    #[test]
    fn rationale_lists_reasons_in_priority_order() {
        let text = build_rationale(&card(12, -3, 3, 71, Verdict::LearnMore), Some(150_000));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "**Score: 71/100 (Learn More)**");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("- Weak moat (12/20)"));
        assert!(lines[2].starts_with("- Material risk penalty (-3)"));
        assert!(lines[3].starts_with("- Business model unclear (3/5)"));
        assert!(lines[4].starts_with("- Strong MRR ($150k)"));
    }

    #[test]
    fn rationale_fallback_bullet() {
        let text = build_rationale(&card(18, 0, 5, 84, Verdict::TakeCall), None);
        assert_eq!(
            text,
            "**Score: 84/100 (Take the Call)**\n- Balanced profile: no single factor dominates the decision."
        );
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(150_000), "$150k");
        assert_eq!(format_money(1_200_000), "$1.2M");
        assert_eq!(format_money(2_000_000), "$2M");
        assert_eq!(format_money(950), "$950");
    }

    #[test]
    fn summary_between_greeting_and_first_header() {
        let mini = "Hi team,\n\nAcmeAI automates legal intake.\nStrong founders.\n\n**Traction**\n$20k MRR";
        assert_eq!(
            extract_summary(mini),
            "AcmeAI automates legal intake.\nStrong founders."
        );
    }

    #[test]
    fn summary_greeting_is_case_insensitive() {
        let mini = "HI TEAM, quick one: AcmeAI is worth a call.\n### Team\nx";
        assert_eq!(extract_summary(mini), "quick one: AcmeAI is worth a call.");
    }

    #[test]
    fn summary_falls_back_to_sections() {
        let mini = "Hi team,\n**Startup Overview**\nLegal ops copilot\n**Solution**\nAI intake\n**Traction**\n$20k MRR\n";
        assert_eq!(
            extract_summary(mini),
            "Legal ops copilot. Solution: AI intake. Traction: $20k MRR."
        );
    }

    #[test]
    fn summary_fallback_tolerates_missing_sections() {
        assert_eq!(
            extract_summary("no greeting, no headers"),
            "Unknown. Solution: Unknown. Traction: Unknown."
        );
    }
}
