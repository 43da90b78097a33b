//! Loads point-of-interest seed data from a JSON file.
//!
//! Format: `[{"id": "poi-1", "name": "Old Harbour", "max_content_count": 3}, ...]`.
//! `max_content_count` is optional and falls back to the configured default.

use crate::domain::{DomainError, PointOfInterest};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
struct SeedEntry {
    id: String,
    name: String,
    #[serde(default)]
    max_content_count: Option<u32>,
}

/// Parse seed JSON. Counts always start at zero; the store keeps existing counts on upsert.
pub fn parse_seed(json: &str, default_max: u32) -> Result<Vec<PointOfInterest>, DomainError> {
    let entries: Vec<SeedEntry> =
        serde_json::from_str(json).map_err(|e| DomainError::Catalog(e.to_string()))?;

    let mut seen = HashSet::new();
    entries
        .into_iter()
        .map(|e| {
            if e.id.trim().is_empty() {
                return Err(DomainError::Catalog("entry with empty id".into()));
            }
            if !seen.insert(e.id.clone()) {
                return Err(DomainError::Catalog(format!("duplicate id '{}'", e.id)));
            }
            Ok(PointOfInterest {
                id: e.id,
                name: e.name,
                max_content_count: e.max_content_count.unwrap_or(default_max),
                current_content_count: 0,
            })
        })
        .collect()
}

/// Read and parse a seed file.
pub async fn load_seed_file(
    path: impl AsRef<Path>,
    default_max: u32,
) -> Result<Vec<PointOfInterest>, DomainError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::Catalog(format!("read {}: {}", path.display(), e)))?;
    parse_seed(&json, default_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_default_max() {
        let json = r#"[
            {"id": "poi-1", "name": "Old Harbour", "max_content_count": 2},
            {"id": "poi-2", "name": "Clock Tower"}
        ]"#;
        let points = parse_seed(json, 5).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].max_content_count, 2);
        assert_eq!(points[1].max_content_count, 5);
        assert!(points.iter().all(|p| p.current_content_count == 0));
    }

    #[test]
    fn test_rejects_duplicates_and_garbage() {
        let dup = r#"[{"id": "x", "name": "A"}, {"id": "x", "name": "B"}]"#;
        assert!(matches!(parse_seed(dup, 1), Err(DomainError::Catalog(_))));
        assert!(matches!(parse_seed("{", 1), Err(DomainError::Catalog(_))));
        let blank = r#"[{"id": " ", "name": "A"}]"#;
        assert!(parse_seed(blank, 1).is_err());
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"id": "p", "name": "Pier"}]"#).unwrap();
        let points = load_seed_file(&path, 3).await.unwrap();
        assert_eq!(points[0].max_content_count, 3);

        let missing = load_seed_file(dir.path().join("none.json"), 3).await;
        assert!(matches!(missing, Err(DomainError::Catalog(_))));
    }
}
