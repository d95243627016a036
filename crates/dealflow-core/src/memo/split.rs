//! Email/document split of the raw assistant output.

use serde::{Deserialize, Serialize};

/// Line the assistant writes between the email half and the full memo.
pub const FULL_MEMO_DELIMITER: &str = "### FULL DEAL MEMO";

/// The two halves of one memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoHalves {
    /// Email-ready summary.
    pub mini: String,
    /// Long-form document rendered to PDF.
    pub full: String,
    /// Whether a delimiter line was found. When false both halves are the
    /// whole input.
    #[serde(default)]
    pub delimited: bool,
}

/// Whether `line` is the delimiter, at any heading depth.
fn is_delimiter_line(line: &str) -> bool {
    let marker = FULL_MEMO_DELIMITER.trim_start_matches('#').trim_start();
    line.trim()
        .trim_start_matches('#')
        .trim()
        .eq_ignore_ascii_case(marker)
}

/// Byte range of the first delimiter line, newline included.
fn delimiter_range(raw: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if is_delimiter_line(line) {
            return Some((start, offset));
        }
    }
    None
}

/// Split on the first delimiter line.
///
/// The delimiter must stand on its own line; `#` heading marks around it are
/// ignored. Without a delimiter both halves are the whole input. Never fails.
pub fn split(raw: &str) -> MemoHalves {
    match delimiter_range(raw) {
        Some((start, end)) => MemoHalves {
            mini: raw[..start].trim().to_string(),
            full: raw[end..].trim().to_string(),
            delimited: true,
        },
        None => MemoHalves {
            mini: raw.to_string(),
            full: raw.to_string(),
            delimited: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_on_delimiter() {
        let raw = "Hi team,\nshort take\n### FULL DEAL MEMO\n# AcmeAI\nlong form";
        let halves = split(raw);
        assert_eq!(halves.mini, "Hi team,\nshort take");
        assert_eq!(halves.full, "# AcmeAI\nlong form");
        assert!(halves.delimited);
    }

    #[test]
    fn missing_delimiter_duplicates_input() {
        let raw = "  just one blob  ";
        let halves = split(raw);
        assert_eq!(halves.mini, raw);
        assert_eq!(halves.full, raw);
        assert!(!halves.delimited);
    }

    #[test]
    fn only_first_delimiter_splits() {
        let raw = "a\n### FULL DEAL MEMO\nb\n### FULL DEAL MEMO\nc";
        let halves = split(raw);
        assert_eq!(halves.mini, "a");
        assert_eq!(halves.full, "b\n### FULL DEAL MEMO\nc");
    }

    #[test]
    fn heading_depth_leaves_no_stray_marks() {
        let halves = split("short take\n#### FULL DEAL MEMO\nlong form");
        assert_eq!(halves.mini, "short take");
        assert_eq!(halves.full, "long form");

        let halves = split("take\n  ## Full Deal Memo  \r\nrest");
        assert_eq!(halves.mini, "take");
        assert_eq!(halves.full, "rest");
    }

    #[test]
    fn delimiter_inside_a_line_does_not_split() {
        let raw = "We call the next part ### FULL DEAL MEMO for short.\nmore";
        let halves = split(raw);
        assert!(!halves.delimited);
        assert_eq!(halves.mini, raw);
    }

    #[test]
    fn resplitting_mini_is_stable() {
        for raw in [
            "Hi team,\nx\n### FULL DEAL MEMO\ny",
            "no delimiter at all",
            "### FULL DEAL MEMO\nonly full",
            "",
        ] {
            let mini = split(raw).mini;
            let again = split(&mini);
            assert_eq!(again.mini, mini);
            assert_eq!(again.full, mini);
        }
    }

    proptest! {
        #[test]
        fn resplitting_any_mini_is_stable(
            lines in proptest::collection::vec(
                prop_oneof![
                    Just("### FULL DEAL MEMO".to_string()),
                    Just("#### full deal memo".to_string()),
                    "[ -~]{0,40}",
                ],
                0..12,
            )
        ) {
            let raw = lines.join("\n");
            let mini = split(&raw).mini;
            let again = split(&mini);
            prop_assert!(!again.delimited);
            prop_assert_eq!(&again.mini, &mini);
            prop_assert_eq!(&again.full, &mini);
        }
    }
}
