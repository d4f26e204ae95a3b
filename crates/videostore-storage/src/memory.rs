use crate::layout;
use crate::traits::{StorageError, StorageResult, VideoBlob, VideoReader, VideoStore};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use videostore_core::constants::{DOWNLOAD_CHUNK_SIZE, UPLOAD_CHUNK_SIZE};
use videostore_core::{StoredVideo, VideoEntry, VideoId};

/// In-memory storage backend.
///
/// Keeps staged uploads and published records in two maps behind `RwLock`s. Useful
/// for tests and throwaway deployments; nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryVideoStore {
    staged: Arc<RwLock<HashMap<VideoId, StagedVideo>>>,
    records: Arc<RwLock<HashMap<VideoId, StoredRecord>>>,
}

#[derive(Debug, Clone)]
struct StagedVideo {
    file_name: String,
    data: Bytes,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    file_name: String,
    data: Bytes,
    /// Serialized exactly as a file backend would write `metadata.json`.
    metadata: Bytes,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn stage_video<'r>(
        &self,
        id: &VideoId,
        extension: Option<&str>,
        mut reader: VideoReader<'r>,
    ) -> StorageResult<u64> {
        let mut data = BytesMut::new();
        loop {
            data.reserve(UPLOAD_CHUNK_SIZE);
            let read = reader
                .read_buf(&mut data)
                .await
                .map_err(StorageError::SourceFailed)?;
            if read == 0 {
                break;
            }
        }

        let size = data.len() as u64;
        self.staged.write().await.insert(
            id.clone(),
            StagedVideo {
                file_name: layout::video_file_name(extension),
                data: data.freeze(),
            },
        );

        tracing::debug!(video_id = %id, size_bytes = size, "Memory storage video staged");
        Ok(size)
    }

    async fn commit(
        &self,
        id: &VideoId,
        metadata: &serde_json::Value,
    ) -> StorageResult<StoredVideo> {
        let encoded = Bytes::from(serde_json::to_vec(metadata)?);

        let staged = self
            .staged
            .write()
            .await
            .remove(id)
            .ok_or_else(|| StorageError::NotStaged(id.to_string()))?;

        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(StorageError::UploadFailed(format!(
                "Video {} already exists",
                id
            )));
        }

        let stored = StoredVideo {
            id: id.clone(),
            file_name: staged.file_name.clone(),
            size_bytes: staged.data.len() as u64,
        };
        records.insert(
            id.clone(),
            StoredRecord {
                file_name: staged.file_name,
                data: staged.data,
                metadata: encoded,
            },
        );

        Ok(stored)
    }

    async fn abort(&self, id: &VideoId) -> StorageResult<()> {
        self.staged.write().await.remove(id);
        Ok(())
    }

    async fn open_video(&self, id: &VideoId) -> StorageResult<VideoBlob> {
        let records = self.records.read().await;
        let record = records
            .get(id)
            .ok_or_else(|| StorageError::NotFound("Video not found".to_string()))?;

        let data = record.data.clone();
        let chunks: Vec<Result<Bytes, StorageError>> = (0..data.len())
            .step_by(DOWNLOAD_CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + DOWNLOAD_CHUNK_SIZE).min(data.len()))))
            .collect();

        Ok(VideoBlob {
            file_name: record.file_name.clone(),
            content_length: data.len() as u64,
            stream: Box::pin(futures::stream::iter(chunks)),
        })
    }

    async fn read_metadata(&self, id: &VideoId) -> StorageResult<Bytes> {
        self.records
            .read()
            .await
            .get(id)
            .map(|record| record.metadata.clone())
            .ok_or_else(|| StorageError::NotFound("Metadata not found".to_string()))
    }

    async fn list(&self) -> StorageResult<Vec<VideoEntry>> {
        let records = self.records.read().await;
        let mut videos = Vec::with_capacity(records.len());

        for (id, record) in records.iter() {
            match serde_json::from_slice(&record.metadata) {
                Ok(metadata) => videos.push(VideoEntry {
                    id: id.clone(),
                    metadata,
                }),
                Err(e) => {
                    tracing::warn!(video_id = %id, error = %e, "Skipping video with corrupt metadata");
                }
            }
        }

        Ok(videos)
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
