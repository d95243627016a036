/// Column layout of the deal tracking sheet.
pub mod sheet {
    /// Header cells, in the order [`crate::DealRecord::to_row`] emits them.
    pub const DEAL_RECORD_COLUMNS: [&str; 11] = [
        "Name", "Summary", "Traction", "Revenue", "Team", "Round", "Tags", "Score", "Status",
        "Action", "Reason",
    ];

    /// Longest summary cell written to the sheet, in characters.
    pub const MAX_SUMMARY_CHARS: usize = 500;

    /// Collapse a multi-line block into one sheet cell.
    ///
    /// Whitespace runs become single spaces and the result is cut to `max`
    /// characters on a char boundary.
    pub fn cell(text: &str, max: usize) -> String {
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        match flat.char_indices().nth(max) {
            Some((idx, _)) => flat[..idx].to_string(),
            None => flat,
        }
    }
}

pub use sheet::DEAL_RECORD_COLUMNS;
