//! Notification outbound port. Inform the external agency of committed content.

use crate::domain::{ContentItem, DomainError, PointOfInterest};

/// Port for notifying the external agency system.
///
/// Implemented by adapters (HTTP agency endpoint, mock). Called only after a
/// durable commit; a failure here never undoes the commit.
#[async_trait::async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Send one notification for a freshly committed item.
    ///
    /// # Arguments
    /// * `item` - The committed content item
    /// * `poi` - Its owner, with the post-commit count
    ///
    /// # Errors
    /// Returns `DomainError::Notify` if the agency cannot be reached or rejects the call.
    async fn notify(&self, item: &ContentItem, poi: &PointOfInterest) -> Result<(), DomainError>;
}
