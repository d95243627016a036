//! Typeform field id → logical submission field.
//!
//! The pitch form identifies answers by opaque field ids. This table is the
//! only place those ids are known; everything downstream works with the
//! logical names accepted by [`crate::Submission::from_fields`].

/// Static `(field_id, logical_name)` table for the pitch form.
pub const FIELD_ID_MAP: &[(&str, &str)] = &[
    // Contact
    ("Wv0KJokmEgXf", "first_name"),
    ("l7veVq4q4lgB", "last_name"),
    ("4Jb9HHo52T8C", "founder_email"),
    ("DWzmnLF1knFo", "incorporation"),
    // Company
    ("mzHp4Tu0OoYM", "name"),
    ("c9HlEwfySxtL", "website"),
    // Role / round (choices)
    ("Qx09I8wJFNK8", "position"),
    ("mUYVKWT1i9PP", "round"),
    // Investors
    ("zLSUDjGaXv6d", "investors"),
    // Pitch content
    ("dVeAPHMXoR2w", "problem"),
    ("oYO4cXbcGLXm", "solution"),
    ("pCZ3KBTQswM6", "market"),
    ("iJYrxnJX3GSH", "traction"),
    ("lPiAAh47JduK", "team"),
    ("rrZqT9pPUwMR", "university"),
    ("fHSrbZW4a1Yd", "competition"),
    ("zFWGX1jtHF0b", "milestones"),
    ("sKaECsQtK6xQ", "vision"),
    // File upload
    ("sBbesO8XqPq9", "pitch_deck_url"),
];

/// Look up the logical name for a form field id.
pub fn logical_name(field_id: &str) -> Option<&'static str> {
    FIELD_ID_MAP
        .iter()
        .find(|(id, _)| *id == field_id)
        .map(|(_, name)| *name)
}

/// Question titles seen on answers that arrive without a field id, keyed by
/// their normalised form (see [`normalise_title`]). A trailing `*` matches
/// any title with that prefix.
pub const FIELD_TITLE_MAP: &[(&str, &str)] = &[
    ("startup name", "name"),
    ("company name", "name"),
    ("website", "website"),
    ("company website", "website"),
    ("funding round", "round"),
    ("which series are you looking to raise", "round"),
    ("investors", "investors"),
    ("do you have a lead investor for this round*", "investors"),
    ("traction", "traction"),
    ("team", "team"),
    ("product", "product"),
    ("solution", "solution"),
    ("problem", "problem"),
    ("market", "market"),
    ("industry", "industry"),
    ("competition", "competition"),
    ("milestones", "milestones"),
    ("milestones to next round", "milestones"),
    ("vision", "vision"),
    ("whats your first name", "first_name"),
    ("whats your last name", "last_name"),
    ("whats your email address*", "founder_email"),
    ("where is the company incorporated", "incorporation"),
    ("position in the company", "position"),
    ("what university did you attend", "university"),
    ("pitch deck", "pitch_deck_url"),
];

/// Lower-case a question title, drop punctuation, and collapse spaces.
pub fn normalise_title(title: &str) -> String {
    title
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up the logical name for a question title.
pub fn logical_name_for_title(title: &str) -> Option<&'static str> {
    let norm = normalise_title(title);
    FIELD_TITLE_MAP
        .iter()
        .find(|(pattern, _)| match pattern.strip_suffix('*') {
            Some(prefix) => norm.starts_with(prefix),
            None => norm == *pattern,
        })
        .map(|(_, name)| *name)
}
