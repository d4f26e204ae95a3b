//! Storage abstraction trait
//!
//! This module defines the VideoStore trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;
use videostore_core::{StoredVideo, VideoEntry, VideoId};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("No staged upload for {0}")]
    NotStaged(String),

    /// The upload source failed while being read, as opposed to the backend failing
    /// to store it. Carries the reader's error untouched.
    #[error("Failed to read upload source: {0}")]
    SourceFailed(std::io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Metadata encoding error: {0}")]
    MetadataEncoding(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Source of video bytes for an upload. May borrow from the request it is read from.
pub type VideoReader<'r> = Pin<Box<dyn AsyncRead + Send + Unpin + 'r>>;

/// Chunked byte stream of a stored video.
pub type VideoStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// A stored video opened for reading.
pub struct VideoBlob {
    /// `video` plus the preserved extension
    pub file_name: String,
    pub content_length: u64,
    pub stream: VideoStream,
}

impl fmt::Debug for VideoBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoBlob")
            .field("file_name", &self.file_name)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Storage abstraction trait
///
/// Handlers only talk to this trait, so the backing store (filesystem, memory, or
/// anything else keyed by id) can change without touching them.
///
/// Writing a record is two-phase: [`stage_video`](VideoStore::stage_video) streams the
/// bytes somewhere invisible, [`commit`](VideoStore::commit) writes the metadata and
/// publishes both at once. [`abort`](VideoStore::abort) throws a staged upload away.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Stream the video bytes for `id` into the staging area.
    ///
    /// `extension` includes the leading dot (`.mov`) and is appended verbatim to the
    /// `video` base name. Returns the number of bytes written.
    ///
    /// Errors raised by `reader` come back as [`StorageError::SourceFailed`].
    async fn stage_video<'r>(
        &self,
        id: &VideoId,
        extension: Option<&str>,
        reader: VideoReader<'r>,
    ) -> StorageResult<u64>;

    /// Write `metadata` next to the staged video and publish the record.
    ///
    /// Fails with [`StorageError::NotStaged`] when no video was staged for `id`.
    async fn commit(&self, id: &VideoId, metadata: &serde_json::Value)
        -> StorageResult<StoredVideo>;

    /// Discard whatever was staged for `id`. Succeeds when nothing was staged.
    async fn abort(&self, id: &VideoId) -> StorageResult<()>;

    /// Open the video file of a published record.
    async fn open_video(&self, id: &VideoId) -> StorageResult<VideoBlob>;

    /// Raw bytes of a record's `metadata.json`, exactly as stored.
    async fn read_metadata(&self, id: &VideoId) -> StorageResult<Bytes>;

    /// Every published record that has both a video file and readable metadata.
    ///
    /// Entries with unparseable metadata are skipped and logged, not reported as errors.
    async fn list(&self) -> StorageResult<Vec<VideoEntry>>;

    /// Check that the backend can currently serve requests.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Stage and commit in one call, aborting the staged data if either step fails.
    async fn put<'r>(
        &self,
        id: &VideoId,
        extension: Option<&str>,
        reader: VideoReader<'r>,
        metadata: &serde_json::Value,
    ) -> StorageResult<StoredVideo> {
        let result = match self.stage_video(id, extension, reader).await {
            Ok(_) => self.commit(id, metadata).await,
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(cleanup_err) = self.abort(id).await {
                tracing::warn!(
                    error = %cleanup_err,
                    video_id = %id,
                    "Failed to discard staged upload"
                );
            }
        }

        result
    }
}
