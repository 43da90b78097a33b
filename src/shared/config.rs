//! Application configuration. Validation rules, storage paths, agency endpoint.

use crate::domain::validation::{DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH};
use crate::domain::{ImageRules, MimeType};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Capacity given to catalog entries that do not state their own.
pub const DEFAULT_MAX_CONTENT_COUNT: u32 = 5;

pub const DEFAULT_PROPOSAL_TTL_SECS: u64 = 900;

pub const DEFAULT_AGENCY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding promo.db. Read from POI_PROMO_DATA_DIR.
    pub data_dir: Option<String>,

    /// JSON seed file for the point-of-interest catalog. Read from POI_PROMO_CATALOG_PATH.
    #[serde(default)]
    pub catalog_path: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Image Validation
    // ─────────────────────────────────────────────────────────────────────────
    /// Comma-separated mime types, e.g. "image/jpeg,image/png". Read from POI_PROMO_ALLOWED_MIME_TYPES.
    #[serde(default)]
    pub allowed_mime_types: Option<String>,

    /// Largest accepted upload in bytes (default 2 MiB). Read from POI_PROMO_MAX_PAYLOAD_BYTES.
    #[serde(default)]
    pub max_payload_bytes: Option<u64>,

    /// Read from POI_PROMO_MIN_WIDTH (default 100).
    #[serde(default)]
    pub min_width: Option<u32>,

    /// Read from POI_PROMO_MIN_HEIGHT (default 50).
    #[serde(default)]
    pub min_height: Option<u32>,

    // ─────────────────────────────────────────────────────────────────────────
    // Workflow
    // ─────────────────────────────────────────────────────────────────────────
    /// Per-entity maximum for seeded points without their own. Read from POI_PROMO_DEFAULT_MAX_CONTENT_COUNT.
    #[serde(default)]
    pub default_max_content_count: Option<u32>,

    /// Seconds a proposal stays confirmable (default 900). Read from POI_PROMO_PROPOSAL_TTL_SECS.
    #[serde(default)]
    pub proposal_ttl_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Agency Notification
    // ─────────────────────────────────────────────────────────────────────────
    /// Agency endpoint. Mock notifier is used when unset. Read from POI_PROMO_AGENCY_URL.
    #[serde(default)]
    pub agency_url: Option<String>,

    /// Bearer token for the agency endpoint. Read from POI_PROMO_AGENCY_TOKEN.
    #[serde(default)]
    pub agency_token: Option<String>,

    /// Per-request timeout for the agency adapter. Read from POI_PROMO_AGENCY_TIMEOUT_SECS.
    #[serde(default)]
    pub agency_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("POI_PROMO").try_parsing(true));
        if let Ok(path) = std::env::var("POI_PROMO_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Returns the configured mime types. Unknown entries are skipped with a warning;
    /// an empty or fully unknown list falls back to the default set.
    pub fn allowed_mime_types_or_default(&self) -> Vec<MimeType> {
        let Some(raw) = self.allowed_mime_types.as_deref() else {
            return ImageRules::default().allowed;
        };
        let mut allowed = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match MimeType::parse(entry) {
                Some(m) if !allowed.contains(&m) => allowed.push(m),
                Some(_) => {}
                None => warn!(entry, "ignoring unknown mime type in POI_PROMO_ALLOWED_MIME_TYPES"),
            }
        }
        if allowed.is_empty() {
            warn!("no usable mime types configured; using defaults");
            return ImageRules::default().allowed;
        }
        allowed
    }

    /// Assemble validator rules from config, falling back to defaults per field.
    pub fn image_rules(&self) -> ImageRules {
        ImageRules {
            allowed: self.allowed_mime_types_or_default(),
            max_bytes: self.max_payload_bytes.unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES),
            min_width: self.min_width.unwrap_or(DEFAULT_MIN_WIDTH),
            min_height: self.min_height.unwrap_or(DEFAULT_MIN_HEIGHT),
        }
    }

    pub fn default_max_content_count_or_default(&self) -> u32 {
        self.default_max_content_count
            .unwrap_or(DEFAULT_MAX_CONTENT_COUNT)
    }

    pub fn proposal_ttl(&self) -> Duration {
        Duration::from_secs(self.proposal_ttl_secs.unwrap_or(DEFAULT_PROPOSAL_TTL_SECS))
    }

    pub fn agency_timeout(&self) -> Duration {
        Duration::from_secs(
            self.agency_timeout_secs
                .unwrap_or(DEFAULT_AGENCY_TIMEOUT_SECS),
        )
    }

    /// Returns true if a real agency endpoint is configured.
    pub fn is_agency_configured(&self) -> bool {
        self.agency_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.image_rules(), ImageRules::default());
        assert_eq!(cfg.data_dir_or_default(), "./data");
        assert_eq!(cfg.default_max_content_count_or_default(), 5);
        assert_eq!(cfg.proposal_ttl(), Duration::from_secs(900));
        assert!(!cfg.is_agency_configured());
    }

    #[test]
    fn test_image_rules_from_values() {
        let cfg = AppConfig {
            allowed_mime_types: Some("image/png, webp ,image/bmp,png".into()),
            max_payload_bytes: Some(1024),
            min_width: Some(640),
            ..AppConfig::default()
        };
        let rules = cfg.image_rules();
        assert_eq!(rules.allowed, vec![MimeType::Png, MimeType::Webp]);
        assert_eq!(rules.max_bytes, 1024);
        assert_eq!(rules.min_width, 640);
        assert_eq!(rules.min_height, DEFAULT_MIN_HEIGHT);
    }

    #[test]
    fn test_unusable_mime_list_falls_back() {
        let cfg = AppConfig {
            allowed_mime_types: Some("text/plain,".into()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.allowed_mime_types_or_default(), ImageRules::default().allowed);
    }

    #[test]
    fn test_blank_agency_url_is_not_configured() {
        let cfg = AppConfig {
            agency_url: Some("  ".into()),
            ..AppConfig::default()
        };
        assert!(!cfg.is_agency_configured());
    }
}
