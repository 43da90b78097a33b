//! In-memory store. Implements PoiDirectory and ContentRepository.
//!
//! Each instance owns its own catalog, so tests can run in parallel without
//! shared process-wide state. Storage failures can be injected deterministically.

use crate::domain::{ContentDraft, ContentItem, DomainError, PointOfInterest};
use crate::ports::{ContentRepository, PoiDirectory, SaveOutcome};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreData {
    points: HashMap<String, PointOfInterest>,
    items: Vec<ContentItem>,
    committed_drafts: HashSet<Uuid>,
    next_id: i64,
}

/// Mutex-guarded store. A save is one critical section: check, increment, insert.
#[derive(Debug)]
pub struct InMemoryRepo {
    data: Mutex<StoreData>,
    failing_saves: AtomicU32,
}

impl InMemoryRepo {
    pub fn with_points(points: impl IntoIterator<Item = PointOfInterest>) -> Self {
        let data = StoreData {
            points: points.into_iter().map(|p| (p.id.clone(), p)).collect(),
            next_id: 1,
            ..StoreData::default()
        };
        Self {
            data: Mutex::new(data),
            failing_saves: AtomicU32::new(0),
        }
    }

    /// Insert or update a catalog entry, keeping the current count of an existing one.
    /// A limit below that count is refused and the entry is left as it was.
    pub async fn upsert_point(&self, poi: PointOfInterest) -> Result<(), DomainError> {
        let mut data = self.data.lock().await;
        match data.points.get_mut(&poi.id) {
            Some(existing) if poi.max_content_count < existing.current_content_count => {
                Err(DomainError::Catalog(format!(
                    "{}: max_content_count {} is below the current count {}",
                    poi.id, poi.max_content_count, existing.current_content_count
                )))
            }
            Some(existing) => {
                existing.name = poi.name;
                existing.max_content_count = poi.max_content_count;
                Ok(())
            }
            None => {
                data.points.insert(poi.id.clone(), poi);
                Ok(())
            }
        }
    }

    /// Make the next `n` saves fail with a storage error, writing nothing.
    pub fn fail_next_saves(&self, n: u32) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }

    pub async fn content_count(&self) -> usize {
        self.data.lock().await.items.len()
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl PoiDirectory for InMemoryRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, DomainError> {
        Ok(self.data.lock().await.points.get(id).cloned())
    }
}

#[async_trait::async_trait]
impl ContentRepository for InMemoryRepo {
    async fn save(&self, draft: &ContentDraft) -> Result<SaveOutcome, DomainError> {
        let mut data = self.data.lock().await;

        if self.take_injected_failure() {
            return Err(DomainError::Repo("injected storage failure".into()));
        }
        if data.committed_drafts.contains(&draft.draft_id) {
            return Err(DomainError::Repo(format!(
                "draft {} is already committed",
                draft.draft_id
            )));
        }

        let poi_id = &draft.point_of_interest_id;
        let point = data
            .points
            .get(poi_id)
            .ok_or_else(|| DomainError::PointNotFound(poi_id.clone()))?;
        if point.current_content_count >= point.max_content_count {
            return Ok(SaveOutcome::CapacityExceeded {
                limit: point.max_content_count,
            });
        }

        let id = data.next_id.max(1);
        data.next_id = id + 1;
        let item = ContentItem {
            id,
            point_of_interest_id: poi_id.clone(),
            descriptor: draft.descriptor,
            created_at: Utc::now(),
        };
        data.items.push(item.clone());
        data.committed_drafts.insert(draft.draft_id);
        let point = match data.points.get_mut(poi_id) {
            Some(p) => {
                p.current_content_count += 1;
                p.clone()
            }
            None => return Err(DomainError::PointNotFound(poi_id.clone())),
        };

        Ok(SaveOutcome::Saved { item, point })
    }

    async fn find_content(&self, id: i64) -> Result<Option<ContentItem>, DomainError> {
        let data = self.data.lock().await;
        Ok(data.items.iter().find(|i| i.id == id).cloned())
    }

    async fn list_for_point(&self, poi_id: &str) -> Result<Vec<ContentItem>, DomainError> {
        let data = self.data.lock().await;
        Ok(data
            .items
            .iter()
            .filter(|i| i.point_of_interest_id == poi_id)
            .cloned()
            .collect())
    }
}
