//! Manifest-backed asset store.
//!
//! The host platform exports its media index as a JSON manifest; this store
//! answers the [`AssetStore`] contract from it. It is deliberately thin
//! glue: queries filter and sort what the manifest declares, resolution
//! checks the referenced files on disk, and saves write a new file next to
//! the manifest and record it there. No indexing or pixel decoding happens
//! here.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::mime::MimeCategory;
use crate::store::{
    AlbumRecord, AssetFilter, AssetRecord, AssetStore, Authorization, MediaKind, MediaPayload,
    NewAsset, StoreError, ThumbnailSpec,
};

/// Serialized manifest root.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub authorization: ManifestAuthorization,
    #[serde(default)]
    pub assets: Vec<ManifestAsset>,
    #[serde(default)]
    pub albums: Vec<ManifestAlbum>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestAuthorization {
    #[default]
    Granted,
    Limited,
    Denied,
}

impl From<ManifestAuthorization> for Authorization {
    fn from(a: ManifestAuthorization) -> Self {
        match a {
            ManifestAuthorization::Granted => Authorization::Granted,
            ManifestAuthorization::Limited => Authorization::Limited,
            ManifestAuthorization::Denied => Authorization::Denied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    Image,
    Video,
    Audio,
}

impl From<ManifestKind> for MediaKind {
    fn from(k: ManifestKind) -> Self {
        match k {
            ManifestKind::Image => MediaKind::Image,
            ManifestKind::Video => MediaKind::Video,
            ManifestKind::Audio => MediaKind::Audio,
        }
    }
}

impl From<MediaKind> for ManifestKind {
    fn from(k: MediaKind) -> Self {
        match k {
            MediaKind::Image => ManifestKind::Image,
            MediaKind::Video => ManifestKind::Video,
            MediaKind::Audio => ManifestKind::Audio,
        }
    }
}

/// One asset as the host declared it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAsset {
    pub id: String,
    pub kind: ManifestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Sourced from a cloud/shared library rather than the device.
    #[serde(default)]
    pub cloud: bool,
    /// Full-size media file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Precomputed thumbnail representation, when the host ships one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAlbum {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub asset_ids: Vec<String>,
}

/// [`AssetStore`] over a manifest file.
pub struct ManifestStore {
    manifest_path: PathBuf,
    /// Directory newly saved assets are written into.
    library_dir: PathBuf,
    inner: RwLock<Manifest>,
}

impl ManifestStore {
    /// Load a manifest from disk. Saved assets land in a `library/`
    /// directory next to the manifest file.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let manifest: Manifest = serde_json::from_str(&raw)?;
        let library_dir = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("library");
        tracing::debug!(
            assets = manifest.assets.len(),
            albums = manifest.albums.len(),
            "manifest loaded"
        );
        Ok(Self {
            manifest_path: path.to_path_buf(),
            library_dir,
            inner: RwLock::new(manifest),
        })
    }

    /// Build a store from an in-memory manifest (tests, embedded hosts).
    /// Saves are recorded in memory and written under `library_dir`.
    pub fn from_manifest(manifest: Manifest, manifest_path: PathBuf, library_dir: PathBuf) -> Self {
        Self {
            manifest_path,
            library_dir,
            inner: RwLock::new(manifest),
        }
    }

    async fn persist(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(manifest)?;
        tokio::fs::write(&self.manifest_path, raw).await?;
        Ok(())
    }

    fn to_record(asset: &ManifestAsset, album_ids: Vec<String>) -> AssetRecord {
        AssetRecord {
            id: asset.id.clone(),
            file_name: asset.file_name.clone(),
            original_file_name: asset.original_file_name.clone(),
            width: asset.width,
            height: asset.height,
            kind: asset.kind.into(),
            creation_date: asset.creation_date,
            latitude: asset.latitude,
            longitude: asset.longitude,
            album_ids,
        }
    }
}

#[async_trait::async_trait]
impl AssetStore for ManifestStore {
    async fn authorization(&self) -> Authorization {
        self.inner.read().await.authorization.into()
    }

    async fn request_authorization(&self) -> Authorization {
        // The permission dialog belongs to the host platform; the manifest
        // carries whatever the user already decided there.
        self.inner.read().await.authorization.into()
    }

    async fn query_assets(
        &self,
        filter: &AssetFilter,
        include_album_data: bool,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        let manifest = self.inner.read().await;

        let mut records: Vec<AssetRecord> = manifest
            .assets
            .iter()
            .filter(|a| filter.matches_kind(a.kind.into()))
            .filter(|a| filter.include_cloud_data || !a.cloud)
            .map(|a| {
                // Membership lookups are the expensive part on real
                // backends; only assemble them when asked.
                let album_ids = if include_album_data {
                    manifest
                        .albums
                        .iter()
                        .filter(|al| al.asset_ids.iter().any(|id| id == &a.id))
                        .map(|al| al.id.clone())
                        .collect()
                } else {
                    Vec::new()
                };
                Self::to_record(a, album_ids)
            })
            .collect();

        // Creation date descending; the stable sort leaves ties (and
        // undated assets) in manifest order.
        records.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
        Ok(records)
    }

    async fn query_albums(&self) -> Result<Vec<AlbumRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .albums
            .iter()
            .map(|a| AlbumRecord {
                id: a.id.clone(),
                title: a.title.clone(),
            })
            .collect())
    }

    async fn resolve_file(&self, asset_id: &str, category: MimeCategory) -> Option<PathBuf> {
        let path = {
            let manifest = self.inner.read().await;
            let asset = manifest.assets.iter().find(|a| a.id == asset_id)?;
            asset.path.clone()?
        };

        if tokio::fs::metadata(&path).await.is_err() {
            tracing::debug!(id = %asset_id, path = %path.display(), "declared file is missing");
            return None;
        }

        match category {
            // Images are handed out as a private temporary copy, so the
            // consumer can move or delete the file freely.
            MimeCategory::Image => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("img")
                    .to_string();
                let tmp = std::env::temp_dir().join(format!("{}.{ext}", Uuid::new_v4()));
                match tokio::fs::copy(&path, &tmp).await {
                    Ok(_) => Some(tmp),
                    Err(e) => {
                        tracing::debug!(id = %asset_id, "could not stage image copy: {e}");
                        None
                    }
                }
            }
            // Videos are served in place.
            MimeCategory::Video => Some(path),
            MimeCategory::Audio | MimeCategory::Unknown => None,
        }
    }

    async fn request_thumbnail(&self, asset_id: &str, _spec: ThumbnailSpec) -> Option<MediaPayload> {
        // Scaling is the host's concern; serve the precomputed thumbnail
        // representation, falling back to the full-size file.
        let path = {
            let manifest = self.inner.read().await;
            let asset = manifest.assets.iter().find(|a| a.id == asset_id)?;
            asset.thumbnail_path.clone().or_else(|| asset.path.clone())?
        };
        let data = tokio::fs::read(&path).await.ok()?;
        Some(MediaPayload {
            data,
            mime_type: crate::mime::mime_for_path(&path.to_string_lossy()).to_string(),
        })
    }

    async fn request_image_data(&self, asset_id: &str) -> Option<MediaPayload> {
        let path = {
            let manifest = self.inner.read().await;
            let asset = manifest.assets.iter().find(|a| a.id == asset_id)?;
            asset.path.clone()?
        };
        let data = tokio::fs::read(&path).await.ok()?;
        Some(MediaPayload {
            data,
            mime_type: crate::mime::mime_for_path(&path.to_string_lossy()).to_string(),
        })
    }

    async fn save_asset(&self, asset: NewAsset, album: &str) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        let default_ext = match asset.kind {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mov",
            MediaKind::Audio => "bin",
        };
        let file_name = asset
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{id}.{default_ext}"));
        let path = self.library_dir.join(&file_name);

        tokio::fs::create_dir_all(&self.library_dir).await?;
        tokio::fs::write(&path, &asset.data).await?;

        let mut manifest = self.inner.write().await;
        manifest.assets.push(ManifestAsset {
            id: id.clone(),
            kind: asset.kind.into(),
            file_name: Some(file_name),
            original_file_name: None,
            width: 0,
            height: 0,
            creation_date: Some(Utc::now()),
            latitude: None,
            longitude: None,
            cloud: false,
            path: Some(path),
            thumbnail_path: None,
        });

        // Get-or-create the target album by title.
        match manifest.albums.iter_mut().find(|a| a.title == album) {
            Some(existing) => existing.asset_ids.push(id),
            None => manifest.albums.push(ManifestAlbum {
                id: Uuid::new_v4().to_string(),
                title: album.to_string(),
                asset_ids: vec![id],
            }),
        }

        self.persist(&manifest).await
    }

    fn stop_caching(&self) {
        // Nothing cached on this backend.
    }
}
