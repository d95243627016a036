//! Header-delimited section extraction.
//!
//! Memo headers drift between generations: `### 📈 Traction`, `**Traction**`,
//! `Traction:` and `__TRACTION__` all introduce the same block. Every logical
//! section owns a list of literal spellings; a line is a header when, once its
//! markup is peeled off, it equals one of those spellings and nothing else.

use std::fmt;

/// Sentinel returned when a section header never appears.
pub const UNKNOWN: &str = "Unknown";

/// Logical memo sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    StartupOverview,
    ExecutiveSummary,
    Problem,
    Solution,
    Market,
    BusinessModel,
    GoToMarket,
    Traction,
    Competition,
    Moat,
    Team,
    CapTable,
    Risks,
    Milestones,
    UseOfFunds,
    Ask,
    ExitStrategy,
    Vision,
    Scorecard,
    Recommendation,
}

/// Literal header spellings per section, compared case-insensitively.
const ALIASES: &[(Section, &[&str])] = &[
    (
        Section::StartupOverview,
        &["Startup Overview", "Company Overview", "Overview", "Company Snapshot"],
    ),
    (
        Section::ExecutiveSummary,
        &["Executive Summary", "Summary", "Synopsis", "TL;DR"],
    ),
    (Section::Problem, &["Problem", "The Problem", "Problem Statement"]),
    (
        Section::Solution,
        &["Solution", "The Solution", "Product", "Product / Solution"],
    ),
    (
        Section::Market,
        &["Market", "Market Size", "Market Opportunity", "TAM / SAM / SOM"],
    ),
    (
        Section::BusinessModel,
        &["Business Model", "Revenue Model", "Monetization"],
    ),
    (
        Section::GoToMarket,
        &["Go-to-Market", "Go To Market", "GTM", "Go-to-Market Strategy"],
    ),
    (
        Section::Traction,
        &["Traction", "Traction & Metrics", "Key Metrics", "Metrics"],
    ),
    (
        Section::Competition,
        &["Competition", "Competitive Landscape", "Competitors"],
    ),
    (
        Section::Moat,
        &[
            "Moat / Defensibility",
            "Moat",
            "Defensibility",
            "Unfair Advantage",
        ],
    ),
    (
        Section::Team,
        &["Team", "Founding Team", "Founders", "Team Snapshot"],
    ),
    (Section::CapTable, &["Cap Table", "Investors", "Current Investors"]),
    (
        Section::Risks,
        &["Risks", "Key Risks", "Risks & Mitigations", "Risk Factors"],
    ),
    (
        Section::Milestones,
        &["Milestones", "Milestones to Next Round"],
    ),
    (Section::UseOfFunds, &["Use of Funds"]),
    (
        Section::Ask,
        &["Ask", "The Ask", "Round Details", "Deal Terms"],
    ),
    (Section::ExitStrategy, &["Exit Strategy", "Exit"]),
    (Section::Vision, &["Vision"]),
    (
        Section::Scorecard,
        &["Scorecard", "Score", "Investment Scorecard", "VC Scorecard"],
    ),
    (
        Section::Recommendation,
        &[
            "Recommendation",
            "Decision",
            "Verdict",
            "Investment Recommendation",
        ],
    ),
];

impl Section {
    /// Every section, in alias-table order.
    pub fn all() -> impl Iterator<Item = Section> {
        ALIASES.iter().map(|(s, _)| *s)
    }

    /// Canonical display label (the first alias).
    pub fn label(self) -> &'static str {
        self.aliases()[0]
    }

    /// Literal header spellings for this section.
    pub fn aliases(self) -> &'static [&'static str] {
        ALIASES
            .iter()
            .find(|(s, _)| *s == self)
            .map(|(_, a)| *a)
            .unwrap_or(&[])
    }

    /// Resolve a logical label or any alias to its section.
    pub fn from_label(label: &str) -> Option<Section> {
        let wanted = label.trim();
        ALIASES
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a.eq_ignore_ascii_case(wanted)))
            .map(|(s, _)| *s)
    }

    /// If `line` is a header for any known section, return that section.
    pub fn from_header_line(line: &str) -> Option<Section> {
        let key = header_text(line)?;
        Section::from_label(key)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Peel header markup off a line and return the bare header text.
///
/// Accepts, in order: `#` heading marks, a leading run of symbols or emoji,
/// bold markup (`**`/`__`), the text, an optional trailing colon, and closing
/// bold markup. Returns `None` for lines that carry nothing but markup.
fn header_text(line: &str) -> Option<&str> {
    let mut s = line.trim();
    s = s.trim_start_matches('#').trim_start();
    s = strip_symbols(s);
    s = strip_bold_prefix(s);
    s = strip_symbols(s);
    s = s.strip_suffix(':').unwrap_or(s).trim_end();
    s = strip_bold_suffix(s).trim_end();
    s = s.strip_suffix(':').unwrap_or(s).trim_end();
    if s.chars().any(char::is_alphanumeric) {
        Some(s)
    } else {
        None
    }
}

/// Drop a leading run of emoji, bullets, and other symbols (but not bold markup).
fn strip_symbols(s: &str) -> &str {
    s.trim_start_matches(|c: char| !c.is_alphanumeric() && c != '*' && c != '_')
}

fn strip_bold_prefix(s: &str) -> &str {
    s.strip_prefix("**")
        .or_else(|| s.strip_prefix("__"))
        .unwrap_or(s)
}

fn strip_bold_suffix(s: &str) -> &str {
    s.strip_suffix("**")
        .or_else(|| s.strip_suffix("__"))
        .unwrap_or(s)
}

/// Locate the first block for `section`, as a byte range into `text`.
///
/// The block starts after the header line and stops at the next line that is
/// a header for *any* section, or at end of text.
fn block_range(section: Section, text: &str) -> Option<(usize, usize)> {
    let mut start: Option<usize> = None;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let header = Section::from_header_line(line);
        match (start, header) {
            (None, Some(found)) if found == section => start = Some(offset),
            (Some(begin), Some(_)) => return Some((begin, line_start)),
            _ => {}
        }
    }
    start.map(|begin| (begin, text.len()))
}

/// Return the trimmed block under `section`'s first header, if any.
pub fn extract_section(section: Section, text: &str) -> Option<String> {
    block_range(section, text).map(|(begin, end)| text[begin..end].trim().to_string())
}

/// Total variant of [`extract_section`]: a miss yields [`UNKNOWN`].
pub fn extract_field(section: Section, text: &str) -> String {
    extract_section(section, text).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Label-addressed lookup for callers holding a section name as text.
///
/// A label outside the alias table can never match a header and yields
/// [`UNKNOWN`].
pub fn extract_field_by_label(label: &str, text: &str) -> String {
    match Section::from_label(label) {
        Some(section) => extract_field(section, text),
        None => UNKNOWN.to_string(),
    }
}

/// Byte offset of the first line that is a header for any section.
pub(crate) fn first_header_offset(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if Section::from_header_line(line).is_some() {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// A `(label, value)` pair pulled from memo text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    pub label: &'static str,
    pub value: String,
}

impl ExtractedField {
    /// Extract `section` from `text`, keeping the section's label.
    pub fn extract(section: Section, text: &str) -> Self {
        Self {
            label: section.label(),
            value: extract_field(section, text),
        }
    }

    /// Whether the header was missing.
    pub fn is_unknown(&self) -> bool {
        self.value == UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MEMO: &str = "\
Hi team,

AcmeAI is building an AI assistant for lawyers.

### 🚀 Startup Overview
Legal ops copilot, Delaware C-corp.

**Traction**
$150k MRR, 30% growth


with 12 logos.

**🛡️ Moat / Defensibility:**
Proprietary data from 50k legal documents.

__TEAM__
2 ex-Google engineers.
";

    #[test]
    fn extracts_bold_header_block() {
        assert_eq!(
            extract_field(Section::Traction, MEMO),
            "$150k MRR, 30% growth\n\n\nwith 12 logos."
        );
    }

    #[test]
    fn extracts_emoji_heading_block() {
        assert_eq!(
            extract_field(Section::StartupOverview, MEMO),
            "Legal ops copilot, Delaware C-corp."
        );
    }

    #[test]
    fn emoji_inside_bold_and_trailing_colon() {
        assert_eq!(
            extract_field(Section::Moat, MEMO),
            "Proprietary data from 50k legal documents."
        );
    }

    #[test]
    fn underscore_bold_is_case_insensitive() {
        assert_eq!(extract_field(Section::Team, MEMO), "2 ex-Google engineers.");
    }

    #[test]
    fn missing_header_is_unknown() {
        assert_eq!(extract_field(Section::Competition, MEMO), UNKNOWN);
        assert_eq!(extract_field(Section::Team, ""), UNKNOWN);
    }

    #[test]
    fn first_occurrence_wins() {
        let text = "Team\nfirst block\nRisks\nsome risk\nTeam\nsecond block\n";
        assert_eq!(extract_field(Section::Team, text), "first block");
    }

    #[test]
    fn alias_spelling_matches_logical_section() {
        let text = "## Unfair Advantage\nGovernment API access\n## Risks\nslow sales";
        assert_eq!(extract_field(Section::Moat, text), "Government API access");
    }

    #[test]
    fn header_with_content_on_same_line_is_not_a_header() {
        let text = "**Traction**: 7/10\nTraction\nreal block";
        assert_eq!(extract_field(Section::Traction, text), "real block");
    }

    #[test]
    fn empty_block_is_empty_not_unknown() {
        let text = "Traction\n\nTeam\nfounders";
        assert_eq!(extract_field(Section::Traction, text), "");
    }

    #[test]
    fn extract_by_label_resolves_aliases() {
        assert_eq!(
            extract_field_by_label("Defensibility", MEMO),
            "Proprietary data from 50k legal documents."
        );
        assert_eq!(extract_field_by_label("Not A Section", MEMO), UNKNOWN);
    }

    #[test]
    fn header_text_peels_markup() {
        assert_eq!(header_text("### 📈 **Traction:**"), Some("Traction"));
        assert_eq!(header_text("  __Team__  "), Some("Team"));
        assert_eq!(header_text("***"), None);
        assert_eq!(header_text(""), None);
    }

    #[test]
    fn first_header_offset_points_at_line_start() {
        let text = "Hi team,\nhello\n**Team**\nx";
        let at = first_header_offset(text).unwrap();
        assert!(text[at..].starts_with("**Team**"));
    }

    #[test]
    fn extracted_field_reports_unknown() {
        let field = ExtractedField::extract(Section::Vision, MEMO);
        assert_eq!(field.label, "Vision");
        assert!(field.is_unknown());
    }

    #[test]
    fn every_section_has_aliases() {
        for section in Section::all() {
            assert!(!section.aliases().is_empty(), "{section:?}");
            assert_eq!(Section::from_label(section.label()), Some(section));
        }
    }

    fn any_section() -> impl Strategy<Value = Section> {
        proptest::sample::select(Section::all().collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn extraction_is_total_and_trimmed(section in any_section(), text in any::<String>()) {
            let field = extract_field(section, &text);
            prop_assert!(field == UNKNOWN || field == field.trim());
        }

        #[test]
        fn headerless_text_is_unknown(section in any_section(), text in "[0-9 .,$%\n]{0,200}") {
            prop_assert_eq!(extract_field(section, &text), UNKNOWN);
        }

        #[test]
        fn block_under_a_header_is_recovered(
            section in any_section(),
            body in "[0-9 .,$%\n]{0,200}",
            tail in "[0-9 .,$%\n]{0,50}",
        ) {
            let text = format!("**{}**\n{body}\n## Risks\n{tail}", section.label());
            prop_assert_eq!(extract_field(section, &text), body.trim());
        }
    }
}
