//! Content-quality rules for promotional images.

use super::image::{ImageDescriptor, ImagePayload, MimeType, probe_dimensions};
use thiserror::Error;

/// Default upload ceiling: 2 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 2 * 1024 * 1024;
pub const DEFAULT_MIN_WIDTH: u32 = 100;
pub const DEFAULT_MIN_HEIGHT: u32 = 50;

/// Why an image was refused. Client-correctable; nothing was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageRejection {
    #[error("image payload is empty")]
    Empty,

    #[error("mime type '{0}' is not allowed")]
    UnsupportedMimeType(String),

    #[error("image is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("image header is not a valid {0}")]
    Undecodable(MimeType),

    #[error("image is {width}x{height}, minimum is {min_width}x{min_height}")]
    TooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
}

/// Validator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRules {
    pub allowed: Vec<MimeType>,
    pub max_bytes: u64,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for ImageRules {
    fn default() -> Self {
        Self {
            allowed: vec![MimeType::Jpeg, MimeType::Png],
            max_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
        }
    }
}

/// Stateless image validator. Rules run in order; the first failure wins:
/// non-empty, allowed mime type, size limit, minimum dimensions.
#[derive(Debug, Clone, Default)]
pub struct ImageValidator {
    rules: ImageRules,
}

impl ImageValidator {
    pub fn new(rules: ImageRules) -> Self {
        Self { rules }
    }

    /// Validate `payload`, returning its descriptor on success.
    pub fn validate(&self, payload: &ImagePayload) -> Result<ImageDescriptor, ImageRejection> {
        if payload.bytes.is_empty() {
            return Err(ImageRejection::Empty);
        }

        let mime = MimeType::parse(&payload.mime_type)
            .filter(|m| self.rules.allowed.contains(m))
            .ok_or_else(|| ImageRejection::UnsupportedMimeType(payload.mime_type.clone()))?;

        let size = payload.byte_size();
        if size > self.rules.max_bytes {
            return Err(ImageRejection::TooLarge {
                size,
                max: self.rules.max_bytes,
            });
        }

        let (width, height) =
            probe_dimensions(&payload.bytes, mime).ok_or(ImageRejection::Undecodable(mime))?;
        if width < self.rules.min_width || height < self.rules.min_height {
            return Err(ImageRejection::TooSmall {
                width,
                height,
                min_width: self.rules.min_width,
                min_height: self.rules.min_height,
            });
        }

        Ok(ImageDescriptor {
            byte_size: size,
            width,
            height,
            mime_type: mime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::fixtures;

    fn validator() -> ImageValidator {
        ImageValidator::default()
    }

    #[test]
    fn test_accepts_valid_jpeg() {
        let payload = ImagePayload::new(fixtures::jpeg(200, 200), "image/jpeg");
        let d = validator().validate(&payload).unwrap();
        assert_eq!(d.width, 200);
        assert_eq!(d.height, 200);
        assert_eq!(d.mime_type, MimeType::Jpeg);
        assert_eq!(d.byte_size, payload.bytes.len() as u64);
    }

    #[test]
    fn test_rejects_empty_before_anything_else() {
        let payload = ImagePayload::new(Vec::new(), "application/pdf");
        assert_eq!(validator().validate(&payload), Err(ImageRejection::Empty));
    }

    #[test]
    fn test_rejects_disallowed_mime() {
        // GIF is probeable but not in the default allowed set.
        let payload = ImagePayload::new(fixtures::gif(300, 300), "image/gif");
        assert_eq!(
            validator().validate(&payload),
            Err(ImageRejection::UnsupportedMimeType("image/gif".into()))
        );

        let payload = ImagePayload::new(vec![1, 2, 3], "text/plain");
        assert!(matches!(
            validator().validate(&payload),
            Err(ImageRejection::UnsupportedMimeType(_))
        ));
    }

    #[test]
    fn test_size_checked_before_dimensions() {
        let rules = ImageRules {
            max_bytes: 16,
            ..ImageRules::default()
        };
        // 1x1 would also fail the dimension rule; size must win.
        let payload = ImagePayload::new(fixtures::png(1, 1), "image/png");
        let err = ImageValidator::new(rules).validate(&payload).unwrap_err();
        assert!(matches!(err, ImageRejection::TooLarge { max: 16, .. }));
    }

    #[test]
    fn test_exact_size_limit_is_allowed() {
        let bytes = fixtures::png(400, 400);
        let rules = ImageRules {
            max_bytes: bytes.len() as u64,
            ..ImageRules::default()
        };
        let payload = ImagePayload::new(bytes, "png");
        assert!(ImageValidator::new(rules).validate(&payload).is_ok());
    }

    #[test]
    fn test_rejects_small_dimensions() {
        let payload = ImagePayload::new(fixtures::png(99, 400), "image/png");
        assert_eq!(
            validator().validate(&payload),
            Err(ImageRejection::TooSmall {
                width: 99,
                height: 400,
                min_width: 100,
                min_height: 50
            })
        );

        // Exactly the minimum passes.
        let payload = ImagePayload::new(fixtures::png(100, 50), "image/png");
        assert!(validator().validate(&payload).is_ok());
    }

    #[test]
    fn test_rejects_mislabelled_payload() {
        let payload = ImagePayload::new(fixtures::png(400, 400), "image/jpeg");
        assert_eq!(
            validator().validate(&payload),
            Err(ImageRejection::Undecodable(MimeType::Jpeg))
        );
    }

    #[test]
    fn test_custom_allowed_set() {
        let rules = ImageRules {
            allowed: vec![MimeType::Webp],
            ..ImageRules::default()
        };
        let v = ImageValidator::new(rules);
        let webp = ImagePayload::new(fixtures::webp_vp8x(800, 600), "image/webp");
        assert!(v.validate(&webp).is_ok());
        let png = ImagePayload::new(fixtures::png(800, 600), "image/png");
        assert!(v.validate(&png).is_err());
    }

    #[test]
    fn test_deterministic() {
        let payload = ImagePayload::new(fixtures::jpeg(640, 480), "jpg");
        let v = validator();
        assert_eq!(v.validate(&payload), v.validate(&payload));
    }
}
