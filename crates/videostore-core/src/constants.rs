//! On-disk layout and transfer constants.

/// Base name of the stored video file. The original extension is appended.
pub const VIDEO_FILE_PREFIX: &str = "video";

/// Name of the metadata document inside a record directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Directory under the storage root where uploads are assembled.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Upload copies go through a buffer of this size (1 MiB).
pub const UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Multipart field carrying the video bytes.
pub const FILE_FIELD: &str = "file";

/// Multipart field carrying the JSON metadata text.
pub const METADATA_FIELD: &str = "metadata";

/// Content type used for every video download.
pub const VIDEO_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type used for metadata downloads.
pub const METADATA_CONTENT_TYPE: &str = "application/json";

/// Read size used when streaming a stored video back to a client (64 KiB).
pub const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;
