//! Scorecard types and the multi-strategy scorecard parser.
//!
//! Strategies run in fixed priority, each a total function returning
//! `Option<Scorecard>`:
//!
//! 1. fenced `json` block (then an untagged fence) in the mini half, then the full half
//! 2. `**Category**: N` bullets anywhere in the memo
//! 3. nothing: the caller substitutes [`Scorecard::default`]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::static_regex;

/// The nine rubric categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Team,
    Market,
    Product,
    Vision,
    Traction,
    BusinessModel,
    Moat,
    RiskAdj,
    Bonus,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 9] = [
        Self::Team,
        Self::Market,
        Self::Product,
        Self::Vision,
        Self::Traction,
        Self::BusinessModel,
        Self::Moat,
        Self::RiskAdj,
        Self::Bonus,
    ];

    /// Key used in structured (JSON) scorecards.
    pub fn key(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Market => "market",
            Self::Product => "product",
            Self::Vision => "vision",
            Self::Traction => "traction",
            Self::BusinessModel => "business_model",
            Self::Moat => "moat",
            Self::RiskAdj => "risk_adj",
            Self::Bonus => "bonus",
        }
    }

    /// Human-facing names used in bullet scorecards. The first is canonical.
    pub fn display_names(self) -> &'static [&'static str] {
        match self {
            Self::Team => &["Team"],
            Self::Market => &["Market"],
            Self::Product => &["Product"],
            Self::Vision => &["Vision"],
            Self::Traction => &["Traction"],
            Self::BusinessModel => &["Business Model"],
            Self::Moat => &["Moat", "Moat / Defensibility", "Defensibility"],
            Self::RiskAdj => &["Risk Adjustment", "Risk Adj", "Risk"],
            Self::Bonus => &["Bonus"],
        }
    }

    /// Declared rubric range. Advisory only: the parser never clamps.
    pub fn range(self) -> (i32, i32) {
        match self {
            Self::Team => (0, 25),
            Self::Market => (0, 20),
            Self::Product => (0, 15),
            Self::Vision => (0, 5),
            Self::Traction => (0, 10),
            Self::BusinessModel => (0, 5),
            Self::Moat => (0, 20),
            Self::RiskAdj => (-15, 0),
            Self::Bonus => (0, 10),
        }
    }

    /// Resolve a structured-block key, tolerating case, spaces, and hyphens.
    pub fn from_key(key: &str) -> Option<ScoreCategory> {
        let norm = key.trim().to_ascii_lowercase().replace([' ', '-', '/'], "_");
        let category = match norm.as_str() {
            "team" => Self::Team,
            "market" => Self::Market,
            "product" => Self::Product,
            "vision" => Self::Vision,
            "traction" => Self::Traction,
            "business_model" | "businessmodel" => Self::BusinessModel,
            "moat" | "defensibility" | "moat___defensibility" => Self::Moat,
            "risk_adj" | "risk" | "risk_adjustment" => Self::RiskAdj,
            "bonus" => Self::Bonus,
            _ => return None,
        };
        Some(category)
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_names()[0])
    }
}

/// Decision attached to a scorecard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    TakeCall,
    LearnMore,
    #[default]
    Pass,
}

/// Score cut-offs for deriving a verdict from a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub take_call: i32,
    pub learn_more: i32,
}

/// Cut-offs applied to totals read straight off bullet scorecards.
pub const BULLET_THRESHOLDS: Thresholds = Thresholds {
    take_call: 82,
    learn_more: 70,
};

/// Cut-offs applied after calibration; these decide the logged action.
pub const CALIBRATED_THRESHOLDS: Thresholds = Thresholds {
    take_call: 80,
    learn_more: 70,
};

impl Verdict {
    /// Monotonic step function of `total`.
    pub fn from_total(total: i32, thresholds: Thresholds) -> Verdict {
        if total >= thresholds.take_call {
            Verdict::TakeCall
        } else if total >= thresholds.learn_more {
            Verdict::LearnMore
        } else {
            Verdict::Pass
        }
    }

    /// Parse a generator-asserted verdict. Anything unrecognised is `LearnMore`.
    pub fn from_label(label: &str) -> Verdict {
        let norm = label
            .trim()
            .to_ascii_uppercase()
            .replace([' ', '-'], "_");
        match norm.as_str() {
            "TAKE_CALL" | "TAKE_THE_CALL" | "TAKECALL" => Verdict::TakeCall,
            "PASS" => Verdict::Pass,
            _ => Verdict::LearnMore,
        }
    }

    /// Wire form, as written in structured scorecards.
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::TakeCall => "TAKE_CALL",
            Verdict::LearnMore => "LEARN_MORE",
            Verdict::Pass => "PASS",
        }
    }

    /// Label shown to GPs in the email and the sheet's action column.
    pub fn human_label(self) -> &'static str {
        match self {
            Verdict::TakeCall => "Take the Call",
            Verdict::LearnMore => "Learn More",
            Verdict::Pass => "Pass",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category subscores plus total and verdict.
///
/// `total` is whatever the source asserted; it only matches the sum of
/// `scores` once [`crate::memo::calibrate`] has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    pub scores: BTreeMap<ScoreCategory, i32>,
    pub total: i32,
    pub verdict: Verdict,
}

impl Scorecard {
    /// Subscore for `category`, 0 when absent.
    pub fn score(&self, category: ScoreCategory) -> i32 {
        self.scores.get(&category).copied().unwrap_or(0)
    }

    /// Sum of all present subscores, saturating at the `i32` bounds.
    pub fn sum(&self) -> i32 {
        sum_scores(&self.scores)
    }
}

/// Subscores are unclamped, so the sum is taken wide and pinned back into
/// range rather than allowed to overflow.
pub(crate) fn sum_scores(scores: &BTreeMap<ScoreCategory, i32>) -> i32 {
    let wide: i64 = scores.values().map(|&v| i64::from(v)).sum();
    wide.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Which strategy produced a scorecard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMethod {
    FencedBlock,
    Bullets,
}

// ── Strategy 1: fenced structured block ──

static TAGGED_FENCE: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"(?is)```[ \t]*json[ \t]*\r?\n(.*?)```"));
static UNTAGGED_FENCE: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"(?s)```[ \t]*\r?\n(.*?)```"));

/// Body of the first `json`-tagged fence, else the first untagged fence.
fn fenced_body(text: &str) -> Option<&str> {
    TAGGED_FENCE
        .captures(text)
        .or_else(|| UNTAGGED_FENCE.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn json_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => parse_signed(s),
        _ => None,
    }
}

fn scorecard_from_object(obj: &Map<String, Value>) -> Option<Scorecard> {
    // Accept `{"scorecard": {...}}`, `{"scores": {...}, ...}`, or flat category keys.
    if let Some(Value::Object(inner)) = obj.get("scorecard") {
        return scorecard_from_object(inner);
    }
    let score_obj = match obj.get("scores") {
        Some(Value::Object(scores)) => scores,
        _ => obj,
    };

    let scores: BTreeMap<ScoreCategory, i32> = score_obj
        .iter()
        .filter_map(|(k, v)| Some((ScoreCategory::from_key(k)?, json_int(v)?)))
        .collect();
    if scores.is_empty() {
        return None;
    }

    let total = obj
        .get("total")
        .and_then(json_int)
        .unwrap_or_else(|| sum_scores(&scores));
    let verdict = match obj.get("verdict").and_then(Value::as_str) {
        Some(label) => Verdict::from_label(label),
        None => Verdict::from_total(total, BULLET_THRESHOLDS),
    };
    Some(Scorecard {
        scores,
        total,
        verdict,
    })
}

/// Parse the first fenced block in `text` as a scorecard.
///
/// A fence that is not well-formed JSON, or carries no rubric keys, is a miss.
pub fn parse_fenced(text: &str) -> Option<Scorecard> {
    let body = fenced_body(text)?;
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(obj)) => scorecard_from_object(&obj),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "fenced scorecard block is malformed");
            None
        }
    }
}

// ── Strategy 2: labelled bullets ──

static BULLET_PATTERNS: LazyLock<Vec<(ScoreCategory, Regex)>> = LazyLock::new(|| {
    ScoreCategory::ALL
        .iter()
        .map(|&category| {
            let names = category
                .display_names()
                .iter()
                .map(|n| regex::escape(n))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(
                r"(?im)^\s*(?:[-*•]\s+)?\*\*\s*(?:{names})\s*:?\s*\*\*\s*:?\s*([+\-−–]?\s*\d+)(?:\s*/\s*\d+)?"
            );
            (category, static_regex(&pattern))
        })
        .collect()
});

/// Parse `**Category**: N` bullets. Needs at least one category to match.
pub fn parse_bullets(text: &str) -> Option<Scorecard> {
    let scores: BTreeMap<ScoreCategory, i32> = BULLET_PATTERNS
        .iter()
        .filter_map(|(category, re)| {
            let caps = re.captures(text)?;
            Some((*category, parse_signed(caps.get(1)?.as_str())?))
        })
        .collect();
    if scores.is_empty() {
        return None;
    }

    let found = scores.len();
    let scores: BTreeMap<ScoreCategory, i32> = ScoreCategory::ALL
        .iter()
        .map(|c| (*c, scores.get(c).copied().unwrap_or(0)))
        .collect();
    let total = sum_scores(&scores);
    debug!(found, total, "parsed bullet scorecard");
    Some(Scorecard {
        scores,
        total,
        verdict: Verdict::from_total(total, BULLET_THRESHOLDS),
    })
}

/// Parse an integer that may use a typographic minus and inner spaces.
fn parse_signed(raw: &str) -> Option<i32> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '−' || c == '–' { '-' } else { c })
        .collect();
    cleaned.parse().ok()
}

// ── Strategy chain ──

/// Run the strategy chain, reporting which strategy won.
pub fn parse_score_with_method(mini: &str, full: &str) -> Option<(Scorecard, ParseMethod)> {
    let fenced = || parse_fenced(mini).or_else(|| parse_fenced(full));
    let bullets = || parse_bullets(mini).or_else(|| parse_bullets(full));

    fenced()
        .map(|sc| (sc, ParseMethod::FencedBlock))
        .or_else(|| bullets().map(|sc| (sc, ParseMethod::Bullets)))
}

/// Recover a scorecard from the two memo halves, or `None` if neither holds one.
pub fn parse_score_any(mini: &str, full: &str) -> Option<Scorecard> {
    parse_score_with_method(mini, full).map(|(sc, _)| sc)
}
