//! Helpers for turning multipart upload fields into storage input

use axum::extract::multipart::Field;
use futures::TryStreamExt;
use std::io;
use tokio_util::io::StreamReader;
use videostore_core::AppError;
use videostore_storage::layout::file_extension;
use videostore_storage::VideoReader;

/// Extension of the uploaded file name, leading dot included (`clip.mov` -> `.mov`).
///
/// An extension with a NUL byte can't be part of a file name and is dropped.
pub fn upload_extension(field: &Field<'_>) -> Option<String> {
    field
        .file_name()
        .and_then(file_extension)
        .filter(|ext| !ext.contains('\0'))
        .map(str::to_owned)
}

/// Adapt a multipart field into an async reader so it can be streamed to storage
/// without buffering the whole file. Read errors wrap the original `MultipartError`
/// so its status survives the trip through storage.
pub fn field_reader<'a>(field: Field<'a>) -> VideoReader<'a> {
    let stream = field.map_err(io::Error::other);
    Box::pin(StreamReader::new(Box::pin(stream)))
}

/// Parse the `metadata` field. Any valid JSON document is accepted.
pub fn parse_metadata(text: &str) -> Result<serde_json::Value, AppError> {
    serde_json::from_str(text).map_err(|e| AppError::InvalidMetadata(e.to_string()))
}
