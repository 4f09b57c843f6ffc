use thiserror::Error;

use crate::store::StoreError;

/// Service-level error taxonomy.
///
/// Per-item resolution failures during an export never surface here; an
/// unresolved item is reported inside its batch with no file path. Only
/// failures that terminate a whole call are represented.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Authorization is not granted; checked before an export starts.
    #[error("Permission Denial: This application is not allowed to access Photo data.")]
    PermissionDenied,

    /// The identifier no longer resolves in the asset store.
    #[error("asset not found: {0}")]
    ItemNotFound(String),

    /// An otherwise-valid asset could not be read.
    #[error("failed to read asset data: {0}")]
    ResolutionFailed(String),

    /// Invalid URL or encoding handed to a save operation.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The asset store failed before or during enumeration.
    #[error(transparent)]
    Store(#[from] StoreError),
}
