//! Submission → assistant prompt.
//!
//! The assistant's own instructions carry the memo format; the prompt is just
//! the founder's answers as labelled lines. The seven core lines are always
//! present (the round extractor scans the `Stage:` line); the remaining pitch
//! fields follow only when answered.

use std::fmt::Write;

use dealflow_core::Submission;

/// Build the user message for one submission.
pub fn build_prompt(sub: &Submission) -> String {
    let mut out = String::new();
    let core = [
        ("Startup", sub.display_name()),
        ("Website", sub.website.trim()),
        ("Stage", sub.round.trim()),
        ("Investors", sub.investors.trim()),
        ("Traction", sub.traction.trim()),
        ("Team", sub.team.trim()),
        ("Product", sub.product_line()),
    ];
    for (label, value) in core {
        let _ = writeln!(out, "{label}: {value}");
    }

    let founder = format!("{} {}", sub.first_name.trim(), sub.last_name.trim());
    let optional = [
        ("Founder", founder.trim()),
        ("Founder Role", sub.position.trim()),
        ("Problem", sub.problem.trim()),
        ("Market", sub.market.trim()),
        ("Industry", sub.industry.trim()),
        ("Competition", sub.competition.trim()),
        ("Milestones", sub.milestones.trim()),
        ("Vision", sub.vision.trim()),
        ("University", sub.university.trim()),
        ("Incorporation", sub.incorporation.trim()),
        ("Pitch Deck", sub.pitch_deck_url.trim()),
    ];
    for (label, value) in optional.into_iter().filter(|(_, v)| !v.is_empty()) {
        let _ = writeln!(out, "{label}: {value}");
    }
    out
}
