//! Rule-based scorecard calibration.
//!
//! Generator subscores drift run to run. Calibration pins a few of them to
//! evidence in the memo text and then re-derives total and verdict, so the
//! result is the single source of truth for everything downstream.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::scorecard::{CALIBRATED_THRESHOLDS, ScoreCategory, Scorecard, Verdict, sum_scores};
use super::sections::{Section, extract_section};
use super::static_regex;

/// MRR at or above this lifts traction to [`TRACTION_FLOOR`].
pub const STRONG_MRR: u64 = 100_000;
pub const TRACTION_FLOOR: i32 = 9;
/// Most negative risk adjustment that survives calibration.
pub const RISK_FLOOR: i32 = -3;
pub const MOAT_FLOOR: i32 = 20;

/// Moat-section phrases that evidence a structural moat.
pub const MOAT_KEYWORDS: &[&str] = &[
    "government api",
    "gov api",
    "compliance",
    "biometric",
    "white-label",
    "white label",
    "proprietary data",
    "dpa",
    "soc2",
    "iso 27001",
];

static MRR_FIGURE: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*([km])?\s*mrr\b"));

/// Largest MRR figure in `text`, with `k`/`m` suffixes expanded.
pub fn max_mrr(text: &str) -> Option<u64> {
    MRR_FIGURE
        .captures_iter(text)
        .filter_map(|caps| {
            let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
            let scale = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
                Some(s) if s == "k" => 1_000.0,
                Some(s) if s == "m" => 1_000_000.0,
                _ => 1.0,
            };
            Some((number * scale).round() as u64)
        })
        .max()
}

/// Whether `moat_text` mentions any [`MOAT_KEYWORDS`] entry.
pub fn has_moat_keyword(moat_text: &str) -> bool {
    let lower = moat_text.to_lowercase();
    MOAT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Apply the traction, risk, and moat floors and re-derive total and verdict.
///
/// Pure and idempotent. Every category appears in the output (absent ones as
/// 0) and `total` always equals the sum of the output subscores.
pub fn calibrate(mini: &str, scorecard: &Scorecard) -> Scorecard {
    let mut scores = scorecard.scores.clone();
    for category in ScoreCategory::ALL {
        scores.entry(category).or_insert(0);
    }

    let traction_text = extract_section(Section::Traction, mini).unwrap_or_default();
    if let Some(mrr) = max_mrr(&traction_text)
        && mrr >= STRONG_MRR
        && let Some(traction) = scores.get_mut(&ScoreCategory::Traction)
        && *traction < TRACTION_FLOOR
    {
        debug!(mrr, from = *traction, "traction floor applied");
        *traction = TRACTION_FLOOR;
    }

    if let Some(risk) = scores.get_mut(&ScoreCategory::RiskAdj) {
        *risk = (*risk).max(RISK_FLOOR);
    }

    let moat_text = extract_section(Section::Moat, mini).unwrap_or_default();
    if has_moat_keyword(&moat_text)
        && let Some(moat) = scores.get_mut(&ScoreCategory::Moat)
        && *moat < MOAT_FLOOR
    {
        debug!(from = *moat, "moat keyword floor applied");
        *moat = MOAT_FLOOR;
    }

    let total = sum_scores(&scores);
    Scorecard {
        scores,
        total,
        verdict: Verdict::from_total(total, CALIBRATED_THRESHOLDS),
    }
}
