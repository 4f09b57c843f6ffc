//! Payload acquisition for save operations.
//!
//! Host shells hand the bridge a `data:` URL, an `http(s)` URL, or a local
//! path; the bytes are fetched here and then passed to the store's
//! change-request boundary. Every failure in this module is `MalformedInput`,
//! failing the single save call and nothing else.

use base64::Engine;

use crate::error::LibraryError;

/// Fetch the bytes referenced by a save URL.
pub async fn fetch_payload(url: &str) -> Result<Vec<u8>, LibraryError> {
    if let Some(rest) = url.strip_prefix("data:") {
        return decode_data_url(rest);
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        let response = reqwest::get(url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LibraryError::MalformedInput(format!("the url could not be read: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LibraryError::MalformedInput(format!("the url could not be read: {e}")))?;
        return Ok(bytes.to_vec());
    }

    let path = url.strip_prefix("file://").unwrap_or(url);
    tokio::fs::read(path)
        .await
        .map_err(|e| LibraryError::MalformedInput(format!("the url could not be read: {e}")))
}

/// Decode the payload of a `data:<mediatype>;base64,<data>` URL. The input
/// is the part after the `data:` scheme prefix.
fn decode_data_url(rest: &str) -> Result<Vec<u8>, LibraryError> {
    let malformed = || LibraryError::MalformedInput("the dataURL could not be parsed".to_string());

    let comma = rest.find(',').ok_or_else(malformed)?;
    let (header, payload) = rest.split_at(comma);
    let payload = &payload[1..];

    // Only base64-encoded data URLs are accepted, and the media type part
    // must be non-empty.
    let media_type = header.strip_suffix(";base64").ok_or_else(malformed)?;
    if media_type.is_empty() {
        return Err(malformed());
    }

    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| LibraryError::MalformedInput("the dataURL could not be decoded".to_string()))
}
