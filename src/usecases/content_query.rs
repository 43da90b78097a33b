//! Read-only queries over the directory and content store.

use crate::domain::{CapacityPolicy, ContentItem, DomainError, PointOfInterest};
use crate::ports::{ContentRepository, PoiDirectory};
use std::sync::Arc;

/// Capacity snapshot for one point of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityStatus {
    pub point: PointOfInterest,
    pub remaining: u32,
}

/// Lookup service for capacity and committed content. Never writes.
pub struct ContentQueryService {
    directory: Arc<dyn PoiDirectory>,
    repo: Arc<dyn ContentRepository>,
    policy: CapacityPolicy,
}

impl ContentQueryService {
    pub fn new(directory: Arc<dyn PoiDirectory>, repo: Arc<dyn ContentRepository>) -> Self {
        Self {
            directory,
            repo,
            policy: CapacityPolicy,
        }
    }

    async fn point(&self, poi_id: &str) -> Result<PointOfInterest, DomainError> {
        self.directory
            .find_by_id(poi_id)
            .await?
            .ok_or_else(|| DomainError::PointNotFound(poi_id.to_string()))
    }

    pub async fn capacity(&self, poi_id: &str) -> Result<CapacityStatus, DomainError> {
        let point = self.point(poi_id).await?;
        let remaining = self.policy.remaining(&point);
        Ok(CapacityStatus { point, remaining })
    }

    /// Content of one point, oldest first. Unknown ids are an error, not an empty list.
    pub async fn list_content(&self, poi_id: &str) -> Result<Vec<ContentItem>, DomainError> {
        self.point(poi_id).await?;
        self.repo.list_for_point(poi_id).await
    }

    pub async fn find_content(&self, id: i64) -> Result<Option<ContentItem>, DomainError> {
        self.repo.find_content(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::InMemoryRepo;
    use crate::domain::{ContentDraft, ImageDescriptor, MimeType};
    use uuid::Uuid;

    fn service() -> (Arc<InMemoryRepo>, ContentQueryService) {
        let repo = Arc::new(InMemoryRepo::with_points([PointOfInterest {
            id: "p".into(),
            name: "Botanical Garden".into(),
            max_content_count: 3,
            current_content_count: 0,
        }]));
        let svc = ContentQueryService::new(repo.clone(), repo.clone());
        (repo, svc)
    }

    #[tokio::test]
    async fn test_capacity_tracks_commits() {
        let (repo, svc) = service();
        assert_eq!(svc.capacity("p").await.unwrap().remaining, 3);

        let saved = repo
            .save(&ContentDraft {
                draft_id: Uuid::new_v4(),
                point_of_interest_id: "p".into(),
                descriptor: ImageDescriptor {
                    byte_size: 100,
                    width: 100,
                    height: 100,
                    mime_type: MimeType::Jpeg,
                },
            })
            .await
            .unwrap();
        assert!(matches!(saved, crate::ports::SaveOutcome::Saved { .. }));

        let status = svc.capacity("p").await.unwrap();
        assert_eq!(status.remaining, 2);
        assert_eq!(status.point.current_content_count, 1);
        assert_eq!(svc.list_content("p").await.unwrap().len(), 1);
        assert!(svc.find_content(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_point() {
        let (_repo, svc) = service();
        assert_eq!(
            svc.capacity("x").await.unwrap_err(),
            DomainError::PointNotFound("x".into())
        );
        assert!(svc.list_content("x").await.is_err());
        assert_eq!(svc.find_content(42).await.unwrap(), None);
    }
}
