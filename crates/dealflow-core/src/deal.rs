//! Shared deal types passed between intake, the pipeline, and delivery.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A startup pitch submission after field-id mapping.
///
/// Every pitch field is optional on the form, so missing answers are empty
/// strings rather than `None`. Answers whose field id is not in the static
/// field map are kept in `unmapped` (keyed by field id) for diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    /// Delivery identifier used for deduplication (Typeform response token).
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub founder_email: String,
    pub incorporation: String,
    pub name: String,
    pub website: String,
    pub position: String,
    pub round: String,
    pub investors: String,
    pub problem: String,
    pub solution: String,
    pub product: String,
    pub market: String,
    pub industry: String,
    pub traction: String,
    pub team: String,
    pub university: String,
    pub competition: String,
    pub milestones: String,
    pub vision: String,
    pub pitch_deck_url: String,
    #[serde(rename = "_unmapped")]
    pub unmapped: BTreeMap<String, String>,
}

impl Submission {
    /// Build a submission from `logical name → value` pairs.
    ///
    /// Logical names not recognised here land in `unmapped` under their own
    /// name, so nothing the form sent is silently dropped.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut sub = Self::default();
        for (key, value) in fields {
            let slot = match key.as_str() {
                "first_name" => &mut sub.first_name,
                "last_name" => &mut sub.last_name,
                "founder_email" => &mut sub.founder_email,
                "incorporation" => &mut sub.incorporation,
                "name" => &mut sub.name,
                "website" => &mut sub.website,
                "position" => &mut sub.position,
                "round" => &mut sub.round,
                "investors" => &mut sub.investors,
                "problem" => &mut sub.problem,
                "solution" => &mut sub.solution,
                "product" => &mut sub.product,
                "market" => &mut sub.market,
                "industry" => &mut sub.industry,
                "traction" => &mut sub.traction,
                "team" => &mut sub.team,
                "university" => &mut sub.university,
                "competition" => &mut sub.competition,
                "milestones" => &mut sub.milestones,
                "vision" => &mut sub.vision,
                "pitch_deck_url" => &mut sub.pitch_deck_url,
                _ => {
                    sub.unmapped.insert(key, value);
                    continue;
                }
            };
            *slot = value;
        }
        sub
    }

    /// Company name for subjects, file names, and the sheet row.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { "Unnamed Startup" } else { name }
    }

    /// Product description, preferring the `solution` answer.
    pub fn product_line(&self) -> &str {
        if self.solution.trim().is_empty() {
            self.product.trim()
        } else {
            self.solution.trim()
        }
    }
}

/// The row appended to the deal tracking sheet.
///
/// Column order is fixed by [`crate::schema::DEAL_RECORD_COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealRecord {
    pub name: String,
    pub summary: String,
    pub traction: String,
    pub revenue: String,
    pub team: String,
    pub round: String,
    pub tags: String,
    pub score: String,
    pub status: String,
    pub action: String,
    pub reason: String,
}

impl DealRecord {
    /// Flatten into sheet cells in column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.summary.clone(),
            self.traction.clone(),
            self.revenue.clone(),
            self.team.clone(),
            self.round.clone(),
            self.tags.clone(),
            self.score.clone(),
            self.status.clone(),
            self.action.clone(),
            self.reason.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DEAL_RECORD_COLUMNS;

    #[test]
    fn from_fields_routes_known_and_unknown_keys() {
        let sub = Submission::from_fields([
            ("name".to_string(), "AcmeAI".to_string()),
            ("round".to_string(), "Seed".to_string()),
            ("cap_table".to_string(), "YC, a16z".to_string()),
        ]);
        assert_eq!(sub.name, "AcmeAI");
        assert_eq!(sub.round, "Seed");
        assert_eq!(sub.unmapped["cap_table"], "YC, a16z");
    }

    #[test]
    fn display_name_falls_back_when_blank() {
        let sub = Submission::default();
        assert_eq!(sub.display_name(), "Unnamed Startup");
    }

    #[test]
    fn product_line_prefers_solution() {
        let sub = Submission {
            solution: "AI intake for law firms".into(),
            product: "Legal copilot".into(),
            ..Default::default()
        };
        assert_eq!(sub.product_line(), "AI intake for law firms");

        let sub = Submission {
            product: "Legal copilot".into(),
            ..Default::default()
        };
        assert_eq!(sub.product_line(), "Legal copilot");
    }

    #[test]
    fn unmapped_serialises_under_diagnostic_key() {
        let mut sub = Submission::default();
        sub.unmapped.insert("zzUnknownId".into(), "42".into());
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["_unmapped"]["zzUnknownId"], "42");
    }

    #[test]
    fn row_matches_column_count() {
        let record = DealRecord {
            name: "AcmeAI".into(),
            score: "71".into(),
            ..Default::default()
        };
        let row = record.to_row();
        assert_eq!(row.len(), DEAL_RECORD_COLUMNS.len());
        assert_eq!(row[0], "AcmeAI");
        assert_eq!(row[7], "71");
    }
}
