//! Delivery: memo PDF rendering plus the Gmail and Google Sheets transports.
//!
//! The Google clients speak plain REST over `reqwest` and are gated behind the
//! `google` feature; the traits and the PDF renderer are always available.

mod error;
pub mod pdf;
mod transport;

#[cfg(feature = "google")]
pub mod google;

pub use error::DeliverError;
pub use pdf::{MemoRenderer, PdfRenderer, RenderError};
pub use transport::{EmailTransport, SheetTransport};

#[cfg(feature = "google")]
pub use google::{GmailClient, SheetsClient};
