//! Capacity policy: may a point of interest take one more content item?

use super::entities::PointOfInterest;

/// Pure comparison of current count against the entity's limit.
///
/// Used twice per insertion: advisory at propose time, authoritative at
/// confirm time (under the per-entity commit lock).
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityPolicy;

impl CapacityPolicy {
    pub fn evaluate(&self, poi: &PointOfInterest) -> bool {
        poi.current_content_count < poi.max_content_count
    }

    /// Free slots left. Zero when full (or over-full after a limit was lowered).
    pub fn remaining(&self, poi: &PointOfInterest) -> u32 {
        poi.max_content_count
            .saturating_sub(poi.current_content_count)
    }
}
