//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use videostore_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Videostore API",
        version = "0.1.0",
        description = "Minimal video storage service: upload a video with a JSON metadata document, list stored videos, and fetch a video's bytes or metadata."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::video_get::list_videos,
        handlers::video_get::get_video_metadata,
        handlers::video_download::download_video,
    ),
    components(
        schemas(
            models::UploadResponse,
            models::VideoSummary,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video upload, listing, and download")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_video_routes() {
        let spec = ApiDoc::openapi();
        for path in ["/videos/", "/videos/{id}/file", "/videos/{id}/metadata"] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
