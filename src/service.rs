//! Library service — the full operation surface exposed to host shells.
//!
//! An explicit instance with injected collaborators (no process-wide
//! singleton): the asset store is the platform boundary, the resolver turns
//! ids into files, and every export call owns its own batching state, so
//! concurrent exports from one service are independent.

use std::sync::Arc;

use base64::Engine;
use tokio_util::sync::CancellationToken;

use crate::error::LibraryError;
use crate::export::{Batch, ExportOptions, ExportStats, Exporter};
use crate::mime::MimeCategory;
use crate::payload;
use crate::resolver::{FileResolver, StoreResolver};
use crate::store::{
    AlbumRecord, AssetFilter, AssetStore, Authorization, MediaKind, MediaPayload, NewAsset,
    ThumbnailSpec,
};

pub struct LibraryService {
    store: Arc<dyn AssetStore>,
    exporter: Exporter,
}

impl LibraryService {
    /// Build a service around a store, resolving files through the store
    /// itself.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        let resolver: Arc<dyn FileResolver> = Arc::new(StoreResolver::new(Arc::clone(&store)));
        Self::with_resolver(store, resolver)
    }

    /// Build a service with a custom resolver (test doubles, alternate
    /// retrieval strategies).
    pub fn with_resolver(store: Arc<dyn AssetStore>, resolver: Arc<dyn FileResolver>) -> Self {
        Self {
            store,
            exporter: Exporter::new(resolver),
        }
    }

    /// Override the secondary-resolution fan-out bound for exports.
    pub fn with_resolve_concurrency(mut self, concurrency: usize) -> Self {
        self.exporter = self.exporter.with_concurrency(concurrency);
        self
    }

    /// Current authorization state, without prompting.
    pub async fn authorization(&self) -> Authorization {
        self.store.authorization().await
    }

    pub async fn has_permission(&self) -> bool {
        self.store.authorization().await.is_permitted()
    }

    /// Prompt for authorization if the platform needs to; fails with
    /// [`LibraryError::PermissionDenied`] when the user declines.
    pub async fn request_authorization(&self) -> Result<(), LibraryError> {
        if self.store.authorization().await.is_permitted() {
            return Ok(());
        }
        if self.store.request_authorization().await.is_permitted() {
            Ok(())
        } else {
            Err(LibraryError::PermissionDenied)
        }
    }

    /// Stream the filtered library to `on_batch` as bounded chunks.
    ///
    /// Fails before any store query when authorization is not granted, and
    /// when the store cannot begin enumeration; per-item resolution failures
    /// are reported inside batches instead (no file path) and never abort
    /// the export.
    pub async fn export<F>(
        &self,
        filter: &AssetFilter,
        options: &ExportOptions,
        cancel: &CancellationToken,
        on_batch: F,
    ) -> Result<ExportStats, LibraryError>
    where
        F: FnMut(Batch),
    {
        if !self.has_permission().await {
            return Err(LibraryError::PermissionDenied);
        }

        let records = self
            .store
            .query_assets(filter, options.include_album_data)
            .await?;
        tracing::debug!(matching = records.len(), "export enumeration starting");

        Ok(self.exporter.run(records, options, cancel, on_batch).await)
    }

    /// List album collections.
    pub async fn albums(&self) -> Result<Vec<AlbumRecord>, LibraryError> {
        Ok(self.store.query_albums().await?)
    }

    /// Fetch a bounded thumbnail for an asset.
    pub async fn thumbnail(
        &self,
        asset_id: &str,
        width: u32,
        height: u32,
        quality: f32,
    ) -> Result<MediaPayload, LibraryError> {
        let spec = ThumbnailSpec {
            width,
            height,
            quality,
        };
        self.store
            .request_thumbnail(asset_id, spec)
            .await
            .ok_or_else(|| LibraryError::ItemNotFound(asset_id.to_string()))
    }

    /// Fetch the full-size image payload for an asset.
    pub async fn photo(&self, asset_id: &str) -> Result<MediaPayload, LibraryError> {
        self.store
            .request_image_data(asset_id)
            .await
            .ok_or_else(|| LibraryError::ItemNotFound(asset_id.to_string()))
    }

    /// Fetch a video's bytes by resolving its file and reading it.
    pub async fn video(&self, asset_id: &str) -> Result<MediaPayload, LibraryError> {
        let data = self.read_resolved(asset_id, MimeCategory::Video).await?;
        Ok(MediaPayload {
            data,
            mime_type: "video/quicktime".to_string(),
        })
    }

    /// Fetch an item's raw bytes, base64-encoded, routed by the caller's
    /// declared mime type. Audio and unknown categories are not retrievable.
    pub async fn item_base64(
        &self,
        asset_id: &str,
        mime_type: &str,
    ) -> Result<String, LibraryError> {
        let data = match MimeCategory::from_mime(mime_type) {
            MimeCategory::Image => {
                self.store
                    .request_image_data(asset_id)
                    .await
                    .ok_or_else(|| LibraryError::ItemNotFound(asset_id.to_string()))?
                    .data
            }
            MimeCategory::Video => self.read_resolved(asset_id, MimeCategory::Video).await?,
            MimeCategory::Audio | MimeCategory::Unknown => {
                return Err(LibraryError::ItemNotFound(asset_id.to_string()));
            }
        };
        Ok(base64::engine::general_purpose::STANDARD.encode(data))
    }

    /// Save an image referenced by a `data:`/`http(s)`/file URL into the
    /// library, adding it to `album` (created when absent).
    pub async fn save_image(&self, url: &str, album: &str) -> Result<(), LibraryError> {
        self.save(url, album, MediaKind::Image).await
    }

    /// Save a video referenced by a URL into the library.
    pub async fn save_video(&self, url: &str, album: &str) -> Result<(), LibraryError> {
        self.save(url, album, MediaKind::Video).await
    }

    /// Release the store's image cache.
    pub fn stop_caching(&self) {
        self.store.stop_caching();
    }

    async fn save(&self, url: &str, album: &str, kind: MediaKind) -> Result<(), LibraryError> {
        let data = payload::fetch_payload(url).await?;
        let asset = NewAsset {
            data,
            kind,
            file_name: None,
        };
        self.store.save_asset(asset, album).await?;
        Ok(())
    }

    async fn read_resolved(
        &self,
        asset_id: &str,
        category: MimeCategory,
    ) -> Result<Vec<u8>, LibraryError> {
        let path = self
            .store
            .resolve_file(asset_id, category)
            .await
            .ok_or_else(|| LibraryError::ItemNotFound(asset_id.to_string()))?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| LibraryError::ResolutionFailed(format!("{}: {e}", path.display())))
    }
}

impl std::fmt::Debug for LibraryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AssetRecord, StoreError};
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn test_tmp_dir(subdir: &str) -> PathBuf {
        std::env::temp_dir().join("photolib-bridge-tests").join(subdir)
    }

    struct MemoryStore {
        auth: Mutex<Authorization>,
        records: Vec<AssetRecord>,
        albums: Vec<AlbumRecord>,
        images: HashMap<String, Vec<u8>>,
        files: HashMap<String, PathBuf>,
        saved: Mutex<Vec<(MediaKind, String, usize)>>,
        queries: AtomicUsize,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                auth: Mutex::new(Authorization::Granted),
                records: Vec::new(),
                albums: Vec::new(),
                images: HashMap::new(),
                files: HashMap::new(),
                saved: Mutex::new(Vec::new()),
                queries: AtomicUsize::new(0),
            }
        }

        fn denied() -> Self {
            let store = Self::new();
            *store.auth.lock().unwrap() = Authorization::Denied;
            store
        }

        fn with_records(records: Vec<AssetRecord>) -> Self {
            Self {
                records,
                ..Self::new()
            }
        }
    }

    #[async_trait::async_trait]
    impl AssetStore for MemoryStore {
        async fn authorization(&self) -> Authorization {
            *self.auth.lock().unwrap()
        }

        async fn request_authorization(&self) -> Authorization {
            *self.auth.lock().unwrap()
        }

        async fn query_assets(
            &self,
            filter: &AssetFilter,
            _include_album_data: bool,
        ) -> Result<Vec<AssetRecord>, StoreError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .records
                .iter()
                .filter(|r| filter.matches_kind(r.kind))
                .cloned()
                .collect())
        }

        async fn query_albums(&self) -> Result<Vec<AlbumRecord>, StoreError> {
            Ok(self.albums.clone())
        }

        async fn resolve_file(&self, asset_id: &str, _category: MimeCategory) -> Option<PathBuf> {
            self.files.get(asset_id).cloned()
        }

        async fn request_thumbnail(
            &self,
            asset_id: &str,
            _spec: ThumbnailSpec,
        ) -> Option<MediaPayload> {
            self.images.get(asset_id).map(|data| MediaPayload {
                data: data.clone(),
                mime_type: "image/jpeg".to_string(),
            })
        }

        async fn request_image_data(&self, asset_id: &str) -> Option<MediaPayload> {
            self.images.get(asset_id).map(|data| MediaPayload {
                data: data.clone(),
                mime_type: "image/jpeg".to_string(),
            })
        }

        async fn save_asset(&self, asset: NewAsset, album: &str) -> Result<(), StoreError> {
            self.saved
                .lock()
                .unwrap()
                .push((asset.kind, album.to_string(), asset.data.len()));
            Ok(())
        }

        fn stop_caching(&self) {}
    }

    fn image_record(id: &str) -> AssetRecord {
        AssetRecord {
            id: id.to_string(),
            file_name: Some(format!("{id}.jpg")),
            original_file_name: None,
            width: 10,
            height: 10,
            kind: MediaKind::Image,
            creation_date: None,
            latitude: None,
            longitude: None,
            album_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_export_denied_before_any_store_query() {
        let store = Arc::new(MemoryStore::denied());
        let service = LibraryService::new(Arc::clone(&store) as Arc<dyn AssetStore>);

        let err = service
            .export(
                &AssetFilter::default(),
                &ExportOptions::default(),
                &CancellationToken::new(),
                |_b| panic!("no batches on denied export"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LibraryError::PermissionDenied));
        assert_eq!(store.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_export_limited_authorization_is_permitted() {
        let store = MemoryStore::with_records(vec![image_record("A")]);
        *store.auth.lock().unwrap() = Authorization::Limited;
        let service = LibraryService::new(Arc::new(store));

        let mut batches = Vec::new();
        let stats = service
            .export(
                &AssetFilter::default(),
                &ExportOptions::default(),
                &CancellationToken::new(),
                |b| batches.push(b),
            )
            .await
            .unwrap();

        assert_eq!(stats.items, 1);
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_last);
    }

    #[tokio::test]
    async fn test_export_items_resolve_through_store_files() {
        let mut store = MemoryStore::with_records(vec![image_record("A"), image_record("B")]);
        store
            .files
            .insert("A".to_string(), PathBuf::from("/media/A.jpg"));
        let service = LibraryService::new(Arc::new(store));

        let mut batches = Vec::new();
        let stats = service
            .export(
                &AssetFilter::default(),
                &ExportOptions::default(),
                &CancellationToken::new(),
                |b| batches.push(b),
            )
            .await
            .unwrap();

        assert_eq!(stats.unresolved, 1);
        let items = &batches[0].items;
        assert_eq!(items[0].file_path, Some(PathBuf::from("/media/A.jpg")));
        assert!(items[1].file_path.is_none());
    }

    #[tokio::test]
    async fn test_request_authorization_denied() {
        let service = LibraryService::new(Arc::new(MemoryStore::denied()));
        let err = service.request_authorization().await.unwrap_err();
        assert!(matches!(err, LibraryError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_albums_pass_through() {
        let store = MemoryStore {
            albums: vec![AlbumRecord {
                id: "AL1".to_string(),
                title: "Holidays".to_string(),
            }],
            ..MemoryStore::new()
        };
        let service = LibraryService::new(Arc::new(store));
        let albums = service.albums().await.unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].title, "Holidays");
    }

    #[tokio::test]
    async fn test_thumbnail_not_found() {
        let service = LibraryService::new(Arc::new(MemoryStore::new()));
        let err = service.thumbnail("NOPE", 128, 128, 0.8).await.unwrap_err();
        assert!(matches!(err, LibraryError::ItemNotFound(id) if id == "NOPE"));
    }

    #[tokio::test]
    async fn test_photo_payload() {
        let mut store = MemoryStore::new();
        store.images.insert("P1".to_string(), vec![1, 2, 3]);
        let service = LibraryService::new(Arc::new(store));

        let payload = service.photo("P1").await.unwrap();
        assert_eq!(payload.data, vec![1, 2, 3]);
        assert_eq!(payload.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_video_reads_resolved_file() {
        let dir = test_tmp_dir("service_video");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("clip.mov");
        fs::write(&path, b"movie-bytes").unwrap();

        let mut store = MemoryStore::new();
        store.files.insert("V1".to_string(), path);
        let service = LibraryService::new(Arc::new(store));

        let payload = service.video("V1").await.unwrap();
        assert_eq!(payload.data, b"movie-bytes");
        assert_eq!(payload.mime_type, "video/quicktime");
    }

    #[tokio::test]
    async fn test_video_unreadable_file_is_resolution_failed() {
        let mut store = MemoryStore::new();
        store
            .files
            .insert("V2".to_string(), PathBuf::from("/no/such/clip.mov"));
        let service = LibraryService::new(Arc::new(store));

        let err = service.video("V2").await.unwrap_err();
        assert!(matches!(err, LibraryError::ResolutionFailed(_)));
    }

    #[tokio::test]
    async fn test_item_base64_image() {
        let mut store = MemoryStore::new();
        store.images.insert("P1".to_string(), b"hello".to_vec());
        let service = LibraryService::new(Arc::new(store));

        let encoded = service.item_base64("P1", "image/jpeg").await.unwrap();
        assert_eq!(encoded, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_item_base64_audio_not_retrievable() {
        let service = LibraryService::new(Arc::new(MemoryStore::new()));
        let err = service.item_base64("A1", "audio/mpeg").await.unwrap_err();
        assert!(matches!(err, LibraryError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_save_image_bad_data_url_does_not_touch_store() {
        let store = Arc::new(MemoryStore::new());
        let service = LibraryService::new(Arc::clone(&store) as Arc<dyn AssetStore>);

        let err = service
            .save_image("data:image/png,not-base64-marked", "Album")
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::MalformedInput(_)));
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_image_hands_payload_to_store() {
        let store = Arc::new(MemoryStore::new());
        let service = LibraryService::new(Arc::clone(&store) as Arc<dyn AssetStore>);

        let encoded = base64::engine::general_purpose::STANDARD.encode(b"png-bytes");
        service
            .save_image(&format!("data:image/png;base64,{encoded}"), "Saved")
            .await
            .unwrap();

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, MediaKind::Image);
        assert_eq!(saved[0].1, "Saved");
        assert_eq!(saved[0].2, b"png-bytes".len());
    }
}
