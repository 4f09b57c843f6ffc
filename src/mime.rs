//! Mime type lookup for exported items.
//!
//! The library reports mime types derived from file name extensions; the
//! coarse category (image/video/audio) drives which retrieval path an asset
//! takes during secondary resolution.

use std::path::Path;

/// Fallback mime type for unrecognized extensions or missing file names.
pub const OCTET_STREAM: &str = "application/octet-stream";

// Extension table for the media formats the bridge reports.
const MIME_TYPES: &[(&str, &str)] = &[
    ("flv", "video/x-flv"),
    ("mp4", "video/mp4"),
    ("m3u8", "application/x-mpegURL"),
    ("ts", "video/MP2T"),
    ("3gp", "video/3gpp"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("wmv", "video/x-ms-wmv"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
];

/// Look up the mime type for a file name or path by extension.
///
/// Unknown extensions (and names without one) map to
/// `application/octet-stream`.
pub fn mime_for_path(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Coarse media category derived from a mime type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeCategory {
    Image,
    Video,
    Audio,
    Unknown,
}

impl MimeCategory {
    /// Classify a mime type by its top-level component.
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or_default() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for MimeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
