use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use videostore_core::constants::METADATA_CONTENT_TYPE;
use videostore_core::{AppError, VideoId, VideoSummary};

#[utoipa::path(
    get,
    path = "/videos/",
    tag = "videos",
    responses(
        (status = 200, description = "All stored videos", body = Vec<VideoSummary>),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_videos"))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VideoSummary>>, HttpAppError> {
    let entries = state.store.list().await?;
    tracing::debug!(count = entries.len(), "Listed videos");

    Ok(Json(entries.into_iter().map(VideoSummary::from).collect()))
}

#[utoipa::path(
    get,
    path = "/videos/{id}/metadata",
    tag = "videos",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Stored metadata document", body = serde_json::Value),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id, operation = "get_video_metadata"))]
pub async fn get_video_metadata(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let id = VideoId::parse(&id)
        .ok_or_else(|| AppError::NotFound("Metadata not found".to_string()))?;

    let metadata = state.store.read_metadata(&id).await?;

    // Served byte-for-byte as stored, not re-encoded.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, METADATA_CONTENT_TYPE)
        .body(Body::from(metadata))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })
}
