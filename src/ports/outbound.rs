//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{ContentDraft, ContentItem, DomainError, PointOfInterest};

/// Read-only view of the point-of-interest catalog.
#[async_trait::async_trait]
pub trait PoiDirectory: Send + Sync {
    /// Look up a point of interest. `Ok(None)` when the id is unknown.
    async fn find_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, DomainError>;
}

/// Result of an attempted commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Item written and the owner's count incremented. `point` has the new count.
    Saved {
        item: ContentItem,
        point: PointOfInterest,
    },
    /// The owner was full at commit time. Nothing was written.
    CapacityExceeded { limit: u32 },
}

/// Content store. Authoritative for what has been committed.
#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync {
    /// Commit a draft: guarded increment of the owner's count plus insert, as one
    /// atomic unit. Either both happen or neither does.
    ///
    /// Retrying a draft whose earlier attempt failed is safe. Saving a draft id
    /// that already committed is rejected with `DomainError::Repo`.
    ///
    /// # Errors
    /// `DomainError::PointNotFound` if the owner is unknown, `DomainError::Repo`
    /// on storage failure.
    async fn save(&self, draft: &ContentDraft) -> Result<SaveOutcome, DomainError>;

    async fn find_content(&self, id: i64) -> Result<Option<ContentItem>, DomainError>;

    /// All content for one point of interest, oldest first.
    async fn list_for_point(&self, poi_id: &str) -> Result<Vec<ContentItem>, DomainError>;
}
