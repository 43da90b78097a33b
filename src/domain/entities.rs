//! Domain entities. Pure data structures for the core business.
//!
//! No database/HTTP types here; adapters map rows and payloads into these.

use super::image::ImageDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A registered location that can carry a limited number of promotional images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub max_content_count: u32,
    pub current_content_count: u32,
}

/// A committed promotional image. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Assigned by the repository at persist time.
    pub id: i64,
    pub point_of_interest_id: String,
    pub descriptor: ImageDescriptor,
    pub created_at: DateTime<Utc>,
}

/// Content item before the repository has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDraft {
    /// Idempotency key. Equal to the proposal token the draft came from.
    pub draft_id: Uuid,
    pub point_of_interest_id: String,
    pub descriptor: ImageDescriptor,
}

/// Opaque single-use handle for a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalToken(Uuid);

impl ProposalToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ProposalToken {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProposalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
