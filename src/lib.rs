//! photolib-bridge — exposes a device photo/video library to cross-platform
//! application shells.
//!
//! The platform's media framework sits behind the [`store::AssetStore`]
//! trait; this crate sequences it: filtered enumeration streamed as bounded,
//! ordered batches with per-item file resolution interleaved, plus the
//! surrounding operations a host shell needs (albums, thumbnails, full
//! payloads, saving new media, permission state).

#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod item;
pub mod manifest;
pub mod mime;
pub mod payload;
pub mod resolver;
pub mod service;
pub mod store;

pub use error::LibraryError;
pub use export::{Batch, ExportOptions, ExportStats, Exporter};
pub use item::LibraryItem;
pub use manifest::ManifestStore;
pub use mime::MimeCategory;
pub use resolver::{FileResolver, Resolution, StoreResolver};
pub use service::LibraryService;
pub use store::{
    AlbumRecord, AssetFilter, AssetRecord, AssetStore, Authorization, MediaKind, MediaPayload,
};
