//! Image payloads and header probing.
//!
//! Only the header is read: enough to learn the pixel size of the declared
//! format. Nothing here decodes pixel data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image formats the directory knows how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeType {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl MimeType {
    /// Parse a declared mime type. Accepts full types (`image/png`) and bare
    /// extensions (`png`), case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("image/").unwrap_or(&lower);
        match name {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Guess the mime type from a file extension (`banner.PNG` -> Png).
    pub fn from_extension(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw upload as handed over by the presentation layer.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    /// Mime type as declared by the caller; not trusted until validated.
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Validated description of an image. Stored with every content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    pub mime_type: MimeType,
}

/// Read `(width, height)` from the header of `bytes` interpreted as `mime`.
/// Returns `None` when the header does not match the format.
pub fn probe_dimensions(bytes: &[u8], mime: MimeType) -> Option<(u32, u32)> {
    match mime {
        MimeType::Png => probe_png(bytes),
        MimeType::Jpeg => probe_jpeg(bytes),
        MimeType::Gif => probe_gif(bytes),
        MimeType::Webp => probe_webp(bytes),
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn be_u16(b: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(b.get(at..at + 2)?.try_into().ok()?))
}

fn be_u32(b: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(b.get(at..at + 4)?.try_into().ok()?))
}

fn le_u16(b: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(b.get(at..at + 2)?.try_into().ok()?))
}

fn le_u24(b: &[u8], at: usize) -> Option<u32> {
    let s = b.get(at..at + 3)?;
    Some(u32::from(s[0]) | (u32::from(s[1]) << 8) | (u32::from(s[2]) << 16))
}

fn probe_png(b: &[u8]) -> Option<(u32, u32)> {
    if b.get(..8)? != PNG_SIGNATURE || b.get(12..16)? != b"IHDR" {
        return None;
    }
    Some((be_u32(b, 16)?, be_u32(b, 20)?))
}

fn probe_jpeg(b: &[u8]) -> Option<(u32, u32)> {
    if b.get(..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut i = 2;
    loop {
        // Skip to the next marker; runs of 0xFF are fill bytes.
        while *b.get(i)? != 0xFF {
            i += 1;
        }
        while *b.get(i)? == 0xFF {
            i += 1;
        }
        let marker = *b.get(i)?;
        i += 1;
        match marker {
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD8 => continue,
            // End of image or start of scan before any frame header.
            0xD9 | 0xDA => return None,
            _ => {}
        }
        let len = usize::from(be_u16(b, i)?);
        if len < 2 {
            return None;
        }
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            let height = be_u16(b, i + 3)?;
            let width = be_u16(b, i + 5)?;
            return Some((u32::from(width), u32::from(height)));
        }
        i += len;
    }
}

fn probe_gif(b: &[u8]) -> Option<(u32, u32)> {
    let sig = b.get(..6)?;
    if sig != b"GIF87a" && sig != b"GIF89a" {
        return None;
    }
    Some((u32::from(le_u16(b, 6)?), u32::from(le_u16(b, 8)?)))
}

fn probe_webp(b: &[u8]) -> Option<(u32, u32)> {
    if b.get(..4)? != b"RIFF" || b.get(8..12)? != b"WEBP" {
        return None;
    }
    match b.get(12..16)? {
        b"VP8X" => Some((le_u24(b, 24)? + 1, le_u24(b, 27)? + 1)),
        b"VP8L" => {
            if *b.get(20)? != 0x2F {
                return None;
            }
            let bits = u32::from_le_bytes(b.get(21..25)?.try_into().ok()?);
            Some(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        b"VP8 " => {
            if b.get(23..26)? != [0x9D, 0x01, 0x2A] {
                return None;
            }
            let w = u32::from(le_u16(b, 26)? & 0x3FFF);
            let h = u32::from(le_u16(b, 28)? & 0x3FFF);
            Some((w, h))
        }
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mime_spellings() {
        assert_eq!(MimeType::parse("image/jpeg"), Some(MimeType::Jpeg));
        assert_eq!(MimeType::parse("IMAGE/JPG"), Some(MimeType::Jpeg));
        assert_eq!(MimeType::parse("png"), Some(MimeType::Png));
        assert_eq!(MimeType::parse(" image/webp "), Some(MimeType::Webp));
        assert_eq!(MimeType::parse("image/bmp"), None);
        assert_eq!(MimeType::parse(""), None);
    }

    #[test]
    fn test_from_extension() {
        let p = std::path::Path::new("/tmp/banner.PNG");
        assert_eq!(MimeType::from_extension(p), Some(MimeType::Png));
        assert_eq!(MimeType::from_extension(std::path::Path::new("noext")), None);
    }

    #[test]
    fn test_probe_png() {
        let b = fixtures::png(640, 480);
        assert_eq!(probe_dimensions(&b, MimeType::Png), Some((640, 480)));
    }

    #[test]
    fn test_probe_jpeg() {
        let b = fixtures::jpeg(200, 150);
        assert_eq!(probe_dimensions(&b, MimeType::Jpeg), Some((200, 150)));
    }

    #[test]
    fn test_probe_gif_and_webp() {
        assert_eq!(
            probe_dimensions(&fixtures::gif(320, 100), MimeType::Gif),
            Some((320, 100))
        );
        assert_eq!(
            probe_dimensions(&fixtures::webp_vp8x(1024, 768), MimeType::Webp),
            Some((1024, 768))
        );
    }

    #[test]
    fn test_probe_mismatched_format() {
        let png = fixtures::png(640, 480);
        assert_eq!(probe_dimensions(&png, MimeType::Jpeg), None);
        assert_eq!(probe_dimensions(&png[..10], MimeType::Png), None);
    }

    #[test]
    fn test_probe_truncated_jpeg() {
        let jpeg = fixtures::jpeg(200, 150);
        assert_eq!(probe_dimensions(&jpeg[..8], MimeType::Jpeg), None);
    }
}
