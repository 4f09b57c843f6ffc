//! Secondary resolution — turning a stable asset id into a retrievable file.

use std::path::PathBuf;
use std::sync::Arc;

use crate::mime::MimeCategory;
use crate::store::AssetStore;

/// Outcome of one resolution attempt. Resolution never errors: a store
/// miss or read failure is reported as `Unresolved` and the attempt is made
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(PathBuf),
    Unresolved,
}

impl Resolution {
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Resolved(path) => Some(path),
            Self::Unresolved => None,
        }
    }
}

/// Resolves an asset id and mime category to a local file.
#[async_trait::async_trait]
pub trait FileResolver: Send + Sync {
    async fn resolve(&self, asset_id: &str, category: MimeCategory) -> Resolution;
}

/// Default resolver: delegates image and video lookups to the asset store.
/// Audio and unknown categories are unresolved without a store round-trip;
/// audio retrieval is not implemented.
pub struct StoreResolver {
    store: Arc<dyn AssetStore>,
}

impl StoreResolver {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl FileResolver for StoreResolver {
    async fn resolve(&self, asset_id: &str, category: MimeCategory) -> Resolution {
        match category {
            MimeCategory::Image | MimeCategory::Video => {
                match self.store.resolve_file(asset_id, category).await {
                    Some(path) => Resolution::Resolved(path),
                    None => {
                        tracing::debug!(id = %asset_id, %category, "asset did not resolve to a file");
                        Resolution::Unresolved
                    }
                }
            }
            MimeCategory::Audio | MimeCategory::Unknown => Resolution::Unresolved,
        }
    }
}
