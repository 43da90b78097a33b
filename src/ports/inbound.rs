//! Inbound ports. UI (adapter) calls into the application.

use crate::domain::{DomainError, Outcome, ProposalToken};

/// Insertion protocol exposed to the presentation layer.
///
/// Every call returns an `Outcome`; there is no error channel.
#[async_trait::async_trait]
pub trait InsertionPort: Send + Sync {
    /// Validate and capacity-check an image. Returns `AwaitingConfirmation` on success.
    async fn request_insertion(&self, poi_id: &str, image: Vec<u8>, mime_type: &str) -> Outcome;

    /// Commit a pending proposal and notify the agency.
    async fn confirm_insertion(&self, token: ProposalToken) -> Outcome;

    /// Drop a pending proposal. Returns `Cancelled`.
    async fn cancel_insertion(&self, token: ProposalToken) -> Outcome;
}

/// Input port: UI/CLI drives the application.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive menu until the user quits.
    async fn run(&self) -> Result<(), DomainError>;
}
