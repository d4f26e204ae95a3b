use crate::layout;
use crate::traits::{StorageError, StorageResult, VideoBlob, VideoReader, VideoStore};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use videostore_core::constants::{
    DOWNLOAD_CHUNK_SIZE, METADATA_FILE_NAME, STAGING_DIR_NAME, UPLOAD_CHUNK_SIZE,
};
use videostore_core::{StoredVideo, VideoEntry, VideoId};

/// Local filesystem storage implementation
///
/// Published records live in `<base_path>/<id>/`; uploads are assembled in
/// `<base_path>/.staging/<id>/` and renamed into place on commit. Both trees share a
/// filesystem, so the rename is atomic.
#[derive(Clone, Debug)]
pub struct LocalVideoStore {
    base_path: PathBuf,
    staging_path: PathBuf,
}

impl LocalVideoStore {
    /// Create a new LocalVideoStore instance
    ///
    /// # Arguments
    /// * `base_path` - Storage root (e.g., "videos"); created if missing
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        let staging_path = base_path.join(STAGING_DIR_NAME);

        fs::create_dir_all(&staging_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                staging_path.display(),
                e
            ))
        })?;

        Ok(LocalVideoStore {
            base_path,
            staging_path,
        })
    }

    /// Ids normally arrive pre-validated; this re-checks them because they become path segments.
    fn checked_id(id: &VideoId) -> StorageResult<&str> {
        match VideoId::parse(id.as_str()) {
            Some(_) => Ok(id.as_str()),
            None => Err(StorageError::InvalidKey(format!(
                "'{}' is not a valid video id",
                id
            ))),
        }
    }

    fn record_dir(&self, id: &VideoId) -> StorageResult<PathBuf> {
        Ok(self.base_path.join(Self::checked_id(id)?))
    }

    fn staging_dir(&self, id: &VideoId) -> StorageResult<PathBuf> {
        Ok(self.staging_path.join(Self::checked_id(id)?))
    }

    /// Names of the regular files directly inside `dir`.
    async fn file_names(dir: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Load one record directory, or `None` when it is not a complete record.
    async fn load_entry(&self, id: VideoId, dir: &Path) -> Option<VideoEntry> {
        let names = match Self::file_names(dir).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Skipping unreadable video directory"
                );
                return None;
            }
        };

        if layout::select_video_file(names.iter()).is_none() {
            tracing::debug!(video_id = %id, "Skipping directory without a video file");
            return None;
        }
        if !names.iter().any(|n| n == METADATA_FILE_NAME) {
            tracing::debug!(video_id = %id, "Skipping directory without metadata");
            return None;
        }

        let metadata_path = dir.join(METADATA_FILE_NAME);
        let raw = match fs::read(&metadata_path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    video_id = %id,
                    path = %metadata_path.display(),
                    error = %e,
                    "Skipping video with unreadable metadata"
                );
                return None;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(metadata) => Some(VideoEntry { id, metadata }),
            Err(e) => {
                tracing::warn!(
                    video_id = %id,
                    path = %metadata_path.display(),
                    error = %e,
                    "Skipping video with corrupt metadata"
                );
                None
            }
        }
    }
}

#[async_trait]
impl VideoStore for LocalVideoStore {
    async fn stage_video<'r>(
        &self,
        id: &VideoId,
        extension: Option<&str>,
        reader: VideoReader<'r>,
    ) -> StorageResult<u64> {
        if extension.is_some_and(|ext| ext.contains(['/', '\\', '\0'])) {
            return Err(StorageError::InvalidKey(
                "File extension contains path separators".to_string(),
            ));
        }

        let dir = self.staging_dir(id)?;
        let start = std::time::Instant::now();

        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create staging directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let path = dir.join(layout::video_file_name(extension));
        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        // Reads and writes fail for different reasons, so they are copied separately.
        let mut reader = BufReader::with_capacity(UPLOAD_CHUNK_SIZE, reader);
        let mut bytes_copied: u64 = 0;
        loop {
            let chunk = reader.fill_buf().await.map_err(StorageError::SourceFailed)?;
            if chunk.is_empty() {
                break;
            }
            let len = chunk.len();
            file.write_all(chunk).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            reader.consume(len);
            bytes_copied += len as u64;
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            video_id = %id,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage video staged"
        );

        Ok(bytes_copied)
    }

    async fn commit(
        &self,
        id: &VideoId,
        metadata: &serde_json::Value,
    ) -> StorageResult<StoredVideo> {
        let staging = self.staging_dir(id)?;
        let target = self.record_dir(id)?;

        let names = match Self::file_names(&staging).await {
            Ok(names) => names,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotStaged(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let file_name = layout::select_video_file(names)
            .ok_or_else(|| StorageError::NotStaged(id.to_string()))?;

        let encoded = serde_json::to_vec(metadata)?;
        let metadata_path = staging.join(METADATA_FILE_NAME);
        let mut file = fs::File::create(&metadata_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                metadata_path.display(),
                e
            ))
        })?;
        file.write_all(&encoded).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                metadata_path.display(),
                e
            ))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                metadata_path.display(),
                e
            ))
        })?;

        if fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::UploadFailed(format!(
                "Video {} already exists",
                id
            )));
        }

        fs::rename(&staging, &target).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to publish {} as {}: {}",
                staging.display(),
                target.display(),
                e
            ))
        })?;

        let size_bytes = fs::metadata(target.join(&file_name)).await?.len();

        tracing::info!(
            path = %target.display(),
            video_id = %id,
            file_name = %file_name,
            size_bytes,
            "Local storage video committed"
        );

        Ok(StoredVideo {
            id: id.clone(),
            file_name,
            size_bytes,
        })
    }

    async fn abort(&self, id: &VideoId) -> StorageResult<()> {
        let dir = self.staging_dir(id)?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(path = %dir.display(), video_id = %id, "Staged upload discarded");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn open_video(&self, id: &VideoId) -> StorageResult<VideoBlob> {
        let dir = self.record_dir(id)?;

        let names = match Self::file_names(&dir).await {
            Ok(names) => names,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound("Video not found".to_string()))
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to read directory {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let file_name = layout::select_video_file(names)
            .ok_or_else(|| StorageError::NotFound("Video file not found".to_string()))?;
        let path = dir.join(&file_name);

        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound("Video file not found".to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to open file {}: {}",
                path.display(),
                e
            )),
        })?;
        let content_length = file.metadata().await?.len();

        let path_display = path.display().to_string();
        let stream = tokio_util::io::ReaderStream::with_capacity(file, DOWNLOAD_CHUNK_SIZE).map(
            move |result| {
                result.map_err(|e| {
                    tracing::error!(path = %path_display, error = %e, "Local storage stream read error");
                    StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
                })
            },
        );

        Ok(VideoBlob {
            file_name,
            content_length,
            stream: Box::pin(stream),
        })
    }

    async fn read_metadata(&self, id: &VideoId) -> StorageResult<Bytes> {
        let path = self.record_dir(id)?.join(METADATA_FILE_NAME);

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound("Metadata not found".to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn list(&self) -> StorageResult<Vec<VideoEntry>> {
        let start = std::time::Instant::now();
        let mut videos = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let Some(id) = entry.file_name().to_str().and_then(VideoId::parse) else {
                continue;
            };

            let path = entry.path();
            // fs::metadata follows symlinks, so a linked record directory still counts.
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => {}
                _ => continue,
            }

            if let Some(video) = self.load_entry(id, &path).await {
                videos.push(video);
            }
        }

        tracing::debug!(
            path = %self.base_path.display(),
            count = videos.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage scan finished"
        );

        Ok(videos)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Storage root {} is not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;

        if !meta.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "Storage root {} is not a directory",
                self.base_path.display()
            )));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn reader(data: &[u8]) -> VideoReader<'static> {
        Box::pin(std::io::Cursor::new(data.to_vec()))
    }

    async fn read_all(blob: VideoBlob) -> Vec<u8> {
        let mut stream = blob.stream;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_put_writes_record_layout() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();

        let stored = store
            .put(&id, Some(".mov"), reader(b"moov"), &json!({"title": "x"}))
            .await
            .unwrap();

        assert_eq!(stored.file_name, "video.mov");
        assert_eq!(stored.size_bytes, 4);

        let record = dir.path().join(id.as_str());
        assert_eq!(std::fs::read(record.join("video.mov")).unwrap(), b"moov");
        let meta: serde_json::Value =
            serde_json::from_slice(&std::fs::read(record.join("metadata.json")).unwrap()).unwrap();
        assert_eq!(meta, json!({"title": "x"}));
        assert!(!dir.path().join(".staging").join(id.as_str()).exists());
    }

    #[tokio::test]
    async fn test_no_extension_stores_bare_video_name() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();

        let stored = store.put(&id, None, reader(b"raw"), &json!({})).await.unwrap();

        assert_eq!(stored.file_name, "video");
        assert!(dir.path().join(id.as_str()).join("video").is_file());
    }

    #[tokio::test]
    async fn test_staged_upload_is_invisible_until_commit() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();

        store.stage_video(&id, Some(".mp4"), reader(b"data")).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(
            store.open_video(&id).await,
            Err(StorageError::NotFound(_))
        ));

        store.commit(&id, &json!({"n": 1})).await.unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
    }

    #[tokio::test]
    async fn test_abort_discards_staging() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();

        store.stage_video(&id, Some(".mp4"), reader(b"data")).await.unwrap();
        store.abort(&id).await.unwrap();
        store.abort(&id).await.unwrap();

        assert!(!dir.path().join(".staging").join(id.as_str()).exists());
        assert!(matches!(
            store.commit(&id, &json!({})).await,
            Err(StorageError::NotStaged(_))
        ));
    }

    #[tokio::test]
    async fn test_large_upload_spans_several_chunks() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();
        let data: Vec<u8> = (0..(UPLOAD_CHUNK_SIZE * 2 + 123))
            .map(|i| (i % 251) as u8)
            .collect();

        let stored = store
            .put(&id, Some(".bin"), reader(&data), &json!(null))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, data.len() as u64);

        let blob = store.open_video(&id).await.unwrap();
        assert_eq!(blob.content_length, data.len() as u64);
        assert_eq!(read_all(blob).await, data);
    }

    #[tokio::test]
    async fn test_read_metadata_returns_stored_bytes() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();
        store
            .put(&id, Some(".mp4"), reader(b"v"), &json!({"tags": [1, 2, 3]}))
            .await
            .unwrap();

        std::fs::write(
            dir.path().join(id.as_str()).join("metadata.json"),
            b"{ \"hand\": \"edited\" }",
        )
        .unwrap();

        let raw = store.read_metadata(&id).await.unwrap();
        assert_eq!(&raw[..], b"{ \"hand\": \"edited\" }");
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();

        assert!(matches!(
            store.open_video(&id).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.read_metadata(&id).await,
            Err(StorageError::NotFound(_))
        ));

        // Directory present but without a video file.
        std::fs::create_dir(dir.path().join(id.as_str())).unwrap();
        std::fs::write(dir.path().join(id.as_str()).join("metadata.json"), b"{}").unwrap();
        assert!(matches!(
            store.open_video(&id).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_skips_incomplete_and_corrupt_records() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let good = VideoId::generate();
        store
            .put(&good, Some(".mp4"), reader(b"ok"), &json!({"ok": true}))
            .await
            .unwrap();

        let root = dir.path();
        std::fs::create_dir(root.join("no-video")).unwrap();
        std::fs::write(root.join("no-video").join("metadata.json"), b"{}").unwrap();
        std::fs::create_dir(root.join("no-meta")).unwrap();
        std::fs::write(root.join("no-meta").join("video.mp4"), b"x").unwrap();
        std::fs::create_dir(root.join("corrupt")).unwrap();
        std::fs::write(root.join("corrupt").join("video.mp4"), b"x").unwrap();
        std::fs::write(root.join("corrupt").join("metadata.json"), b"not json").unwrap();
        std::fs::write(root.join("stray-file"), b"x").unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, good);
        assert_eq!(listed[0].metadata, json!({"ok": true}));
    }

    struct FailingReader;

    impl tokio::io::AsyncRead for FailingReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "client went away",
            )))
        }
    }

    #[tokio::test]
    async fn test_reader_failure_is_reported_as_source_error() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();

        let result = store.stage_video(&id, Some(".mp4"), Box::pin(FailingReader)).await;
        match result {
            Err(StorageError::SourceFailed(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("Expected SourceFailed, got {:?}", other),
        }

        store.abort(&id).await.unwrap();
        assert!(!dir.path().join(".staging").join(id.as_str()).exists());
    }

    #[tokio::test]
    async fn test_rejects_separator_in_extension() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path()).await.unwrap();
        let id = VideoId::generate();

        let result = store.stage_video(&id, Some("./../../x"), reader(b"x")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempdir().unwrap();
        let store = LocalVideoStore::new(dir.path().join("videos")).await.unwrap();
        assert!(store.health_check().await.is_ok());
        assert_eq!(store.backend_type(), StorageBackend::Local);

        std::fs::remove_dir_all(dir.path().join("videos")).unwrap();
        assert!(store.health_check().await.is_err());
    }
}
