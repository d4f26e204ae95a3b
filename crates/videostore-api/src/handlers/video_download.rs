use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use videostore_core::constants::VIDEO_CONTENT_TYPE;
use videostore_core::{AppError, VideoId};

#[utoipa::path(
    get,
    path = "/videos/{id}/file",
    tag = "videos",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id, operation = "download_video"))]
pub async fn download_video(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let id = VideoId::parse(&id)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let blob = state.store.open_video(&id).await?;
    tracing::debug!(
        file_name = %blob.file_name,
        content_length = blob.content_length,
        "Streaming video"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, blob.content_length)
        .body(Body::from_stream(blob.stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })
}
