//! Asset store boundary — the seam between the bridge and the platform's
//! media framework. Everything hard (indexing, predicate evaluation,
//! permission dialogs, image scaling) lives behind this trait; the bridge
//! only sequences calls into it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::mime::MimeCategory;

/// Errors raised by an asset store implementation.
///
/// A store error aborts the calling operation as a whole; per-item
/// not-found conditions are signalled through `Option` returns instead.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),
    #[error("change request failed: {0}")]
    ChangeRequest(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Tri-state authorization result. `Limited` (a user-curated subset of the
/// library) counts as permitted for every read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Limited,
    Denied,
}

impl Authorization {
    pub fn is_permitted(self) -> bool {
        matches!(self, Self::Granted | Self::Limited)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Limited => "limited",
            Self::Denied => "denied",
        }
    }
}

/// Media kind as the store records it, independent of any file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// Which asset classes a query should match.
///
/// With both `include_images` and `include_videos` false the result set is
/// empty; there is no implicit "everything" default.
#[derive(Debug, Clone, Copy)]
pub struct AssetFilter {
    pub include_images: bool,
    pub include_videos: bool,
    pub include_cloud_data: bool,
}

impl Default for AssetFilter {
    fn default() -> Self {
        Self {
            include_images: true,
            include_videos: true,
            include_cloud_data: true,
        }
    }
}

impl AssetFilter {
    pub fn matches_kind(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Image => self.include_images,
            MediaKind::Video => self.include_videos,
            MediaKind::Audio => false,
        }
    }
}

/// One native asset record as the store reports it.
///
/// `album_ids` is only populated when the query asked for album data;
/// membership lookups are expensive on real backends.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub id: String,
    pub file_name: Option<String>,
    pub original_file_name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub kind: MediaKind,
    pub creation_date: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub album_ids: Vec<String>,
}

/// One album collection.
#[derive(Debug, Clone)]
pub struct AlbumRecord {
    pub id: String,
    pub title: String,
}

/// Raw media bytes together with the mime type they were served as.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Target geometry and quality for a thumbnail request. Scaling itself is
/// the store's concern; the bridge never decodes pixels.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub quality: f32,
}

/// A new asset handed to the store's change-request boundary.
#[derive(Debug)]
pub struct NewAsset {
    pub data: Vec<u8>,
    pub kind: MediaKind,
    pub file_name: Option<String>,
}

/// The platform media framework, as consumed by the bridge.
///
/// `resolve_file`, `request_thumbnail`, and `request_image_data` signal
/// ordinary not-found through `None` rather than an error; a missing item
/// must never abort a batched caller.
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Current authorization state, without prompting.
    async fn authorization(&self) -> Authorization;

    /// Request authorization; may present a user-facing dialog on real
    /// platforms. Returns the resulting state.
    async fn request_authorization(&self) -> Authorization;

    /// Query matching assets, ordered by creation date descending with ties
    /// left in store-native order.
    async fn query_assets(
        &self,
        filter: &AssetFilter,
        include_album_data: bool,
    ) -> Result<Vec<AssetRecord>, StoreError>;

    /// Enumerate album collections.
    async fn query_albums(&self) -> Result<Vec<AlbumRecord>, StoreError>;

    /// Resolve an asset id to a locally retrievable file.
    async fn resolve_file(&self, asset_id: &str, category: MimeCategory) -> Option<PathBuf>;

    /// Produce a bounded thumbnail payload for an asset.
    async fn request_thumbnail(&self, asset_id: &str, spec: ThumbnailSpec) -> Option<MediaPayload>;

    /// Produce the full-size image payload for an asset.
    async fn request_image_data(&self, asset_id: &str) -> Option<MediaPayload>;

    /// Create a new asset, adding it to `album` (created when absent).
    async fn save_asset(&self, asset: NewAsset, album: &str) -> Result<(), StoreError>;

    /// Release any platform-side image cache held for this bridge.
    fn stop_caching(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_permitted() {
        assert!(Authorization::Granted.is_permitted());
        assert!(Authorization::Limited.is_permitted());
        assert!(!Authorization::Denied.is_permitted());
    }

    #[test]
    fn test_filter_default_includes_both_kinds() {
        let filter = AssetFilter::default();
        assert!(filter.matches_kind(MediaKind::Image));
        assert!(filter.matches_kind(MediaKind::Video));
        assert!(!filter.matches_kind(MediaKind::Audio));
    }

    #[test]
    fn test_filter_images_only() {
        let filter = AssetFilter {
            include_images: true,
            include_videos: false,
            include_cloud_data: true,
        };
        assert!(filter.matches_kind(MediaKind::Image));
        assert!(!filter.matches_kind(MediaKind::Video));
    }

    #[test]
    fn test_filter_nothing_selected() {
        let filter = AssetFilter {
            include_images: false,
            include_videos: false,
            include_cloud_data: false,
        };
        assert!(!filter.matches_kind(MediaKind::Image));
        assert!(!filter.matches_kind(MediaKind::Video));
    }
}
