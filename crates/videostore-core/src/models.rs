//! Video record models shared by the store and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Identifier of one stored video record.
///
/// Freshly issued ids are UUID v4 strings. Ids read back from storage or from a
/// request path are accepted as long as they name a single, non-hidden path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn generate() -> Self {
        VideoId(Uuid::new_v4().to_string())
    }

    /// Returns `None` for anything that could escape the storage root or hit the staging area.
    pub fn parse(raw: &str) -> Option<Self> {
        let safe = !raw.is_empty()
            && !raw.starts_with('.')
            && !raw.contains(['/', '\\', '\0'])
            && raw != "..";
        safe.then(|| VideoId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path under which the video bytes are served.
    pub fn video_url(&self) -> String {
        format!("/videos/{}/file", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Response body of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    #[schema(value_type = String, example = "6f1c2b1e-9a53-4c3e-8d0e-3b0b1e0c9a11")]
    pub id: VideoId,
}

/// One element of the list response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoSummary {
    #[schema(value_type = String)]
    pub id: VideoId,
    #[schema(example = "/videos/6f1c2b1e-9a53-4c3e-8d0e-3b0b1e0c9a11/file")]
    pub video_url: String,
    /// Metadata exactly as stored at upload time
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

impl From<VideoEntry> for VideoSummary {
    fn from(entry: VideoEntry) -> Self {
        VideoSummary {
            video_url: entry.id.video_url(),
            id: entry.id,
            metadata: entry.metadata,
        }
    }
}

/// A complete record as seen by a storage scan.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoEntry {
    pub id: VideoId,
    pub metadata: serde_json::Value,
}

/// What a commit published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVideo {
    pub id: VideoId,
    /// `video` plus the preserved extension
    pub file_name: String,
    pub size_bytes: u64,
}
