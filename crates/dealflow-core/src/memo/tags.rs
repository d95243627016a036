//! Keyword-driven sector tags for the tracking sheet.
//!
//! Tags are multi-select: every rule whose pattern matches contributes its
//! tag, in rule order, deduplicated. `AI` is checked separately and always
//! leads when present; the submission's funding round trails as its own tag.

use std::sync::LazyLock;

use regex::Regex;

use super::static_regex;

/// Cap on keyword tags (the `AI` tag included, the round tag excluded).
pub const MAX_TAGS: usize = 5;

/// `(pattern, tag)` rules, tested in order against lower-cased text.
const TAG_RULES: &[(&str, &str)] = &[
    (r"\b(?:visa|passport|immigration|travel|border|relocation)\b", "TravelTech"),
    (
        r"\b(?:llms?|gpt|nlp|natural language|chatbots?|language models?)\b",
        "NLP",
    ),
    (
        r"\b(?:compliance|regulat\w*|regtech|kyc|aml|soc ?2|gdpr|audits?)\b",
        "RegTech",
    ),
    (r"\b(?:apis?|sdks?|developer platform|white-?label)\b", "API"),
    (r"\b(?:legal|lawyers?|law firms?|contracts?|legaltech)\b", "LegalTech"),
    (
        r"\b(?:health|healthcare|clinics?|patients?|medical|telehealth)\b",
        "HealthTech",
    ),
    (
        r"\b(?:fintech|payments?|banking|lending|insurance|insurtech)\b",
        "FinTech",
    ),
    (r"\b(?:saas|subscriptions?|per seat|recurring revenue)\b", "SaaS"),
    (r"\bmarketplaces?\b", "Marketplace"),
    (r"\b(?:edtech|education|students?|tutoring)\b", "EdTech"),
    (r"\b(?:biometrics?|identity|e-?kyc|liveness)\b", "Identity"),
    (r"\b(?:security|cyber\w*|fraud)\b", "Security"),
    (r"\b(?:e-?commerce|retail|shopping|d2c)\b", "Commerce"),
    (r"\b(?:climate|carbon|energy|solar|emissions)\b", "ClimateTech"),
    (r"\b(?:logistics|supply chain|fleet|shipping|freight)\b", "Logistics"),
    (r"\b(?:real estate|proptech|property|rental)\b", "PropTech"),
    (r"\b(?:hr|recruit\w*|hiring|payroll)\b", "HRTech"),
];

static COMPILED_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    TAG_RULES
        .iter()
        .map(|(pattern, tag)| (static_regex(pattern), *tag))
        .collect()
});

static AI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(
        r"\b(?:ai|ml|llms?|gpt\w*|machine learning|artificial intelligence|deep learning|neural)\b",
    )
});

/// Infer sector tags from memo text plus selected submission fields.
///
/// `round` is the submission's funding round as typed; it is title-cased and
/// appended when non-empty and not a placeholder.
pub fn infer_tags(memo: &str, fields: &[&str], round: &str) -> Vec<String> {
    let mut haystack = memo.to_lowercase();
    for field in fields {
        haystack.push('\n');
        haystack.push_str(&field.to_lowercase());
    }

    let mut tags: Vec<String> = Vec::new();
    if AI_PATTERN.is_match(&haystack) {
        tags.push("AI".to_string());
    }
    for (re, tag) in COMPILED_RULES.iter() {
        if re.is_match(&haystack) && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags.truncate(MAX_TAGS);

    let round = title_case(round.trim());
    if !round.is_empty() && !is_placeholder(&round) && !tags.contains(&round) {
        tags.push(round);
    }
    tags
}

fn is_placeholder(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "na" | "n/a" | "none" | "-")
}

/// `pre-seed` → `Pre-Seed`, `series a` → `Series A`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = c.is_whitespace() || c == '-' || c == '/';
    }
    out
}
