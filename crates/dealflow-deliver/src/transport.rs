//! Outbound delivery seams. The pipeline holds these as trait objects so runs
//! can be exercised without Google credentials.

use std::path::Path;

use async_trait::async_trait;

use crate::error::DeliverError;

#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send one message, returning the provider's message id.
    ///
    /// An empty `to` is refused with [`DeliverError::NoRecipients`] before any
    /// I/O.
    async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<String, DeliverError>;
}

#[async_trait]
pub trait SheetTransport: Send + Sync {
    /// Append one row below the existing data.
    async fn append(&self, row: &[String]) -> Result<(), DeliverError>;
}
