//! Core types for the deal-flow pipeline.
//!
//! Pure and I/O-free: the intake record, the tracking-sheet row, the Typeform
//! field mapping, and the memo extraction engine that turns assistant output
//! into a calibrated scorecard and sheet signals.

pub mod deal;
pub mod field_map;
pub mod memo;
pub mod schema;

pub use deal::{DealRecord, Submission};
pub use memo::{MemoAnalysis, Scorecard, Section, Verdict, analyze};
pub use schema::DEAL_RECORD_COLUMNS;
