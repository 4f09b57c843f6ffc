//! The exported item shape and the projection from native asset records.

use std::path::PathBuf;

use chrono::SecondsFormat;
use serde::Serialize;

use crate::mime::{self, MimeCategory};
use crate::store::AssetRecord;

/// One library item in the dictionary shape handed to host shells.
///
/// Absent optional fields are omitted from the serialized form rather than
/// placeholder-filled. `file_path` starts out unset and is attached once
/// secondary resolution has an outcome; a batch is only reported after every
/// item in it has one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl LibraryItem {
    /// Coarse media category, derived from the reported mime type.
    pub fn mime_category(&self) -> MimeCategory {
        MimeCategory::from_mime(&self.mime_type)
    }
}

impl std::fmt::Display for LibraryItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<LibraryItem: id={}>", self.id)
    }
}

/// Project a native asset record into the exported item shape.
///
/// Pure metadata conversion: no I/O, no failure mode. The resolved file
/// path is filled in later by the exporter.
pub fn project(
    record: &AssetRecord,
    use_original_file_names: bool,
    include_album_data: bool,
) -> LibraryItem {
    // Original file names come from a slower store lookup; only report them
    // when the caller opted in.
    let file_name = if use_original_file_names {
        record.original_file_name.clone()
    } else {
        record.file_name.clone()
    };

    let mime_type = file_name
        .as_deref()
        .map(mime::mime_for_path)
        .unwrap_or(mime::OCTET_STREAM)
        .to_string();

    let creation_date = record
        .creation_date
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, false));

    let album_ids = include_album_data.then(|| record.album_ids.clone());

    LibraryItem {
        id: record.id.clone(),
        file_name,
        width: record.width,
        height: record.height,
        mime_type,
        creation_date,
        latitude: record.latitude,
        longitude: record.longitude,
        album_ids,
        file_path: None,
    }
}
