use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{field_reader, parse_metadata, upload_extension};
use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use videostore_core::constants::{FILE_FIELD, METADATA_FIELD};
use videostore_core::{AppError, StoredVideo, UploadResponse, VideoId};

#[utoipa::path(
    post,
    path = "/videos/",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields `file` (the video) and `metadata` (a JSON document as text)"),
    responses(
        (status = 200, description = "Video stored", body = UploadResponse),
        (status = 400, description = "Missing field or invalid JSON metadata", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the configured size limit", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(video_id = tracing::field::Empty, operation = "upload_video")
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let id = VideoId::generate();
    tracing::Span::current().record("video_id", tracing::field::display(&id));

    match receive_upload(&state, &id, multipart).await {
        Ok(stored) => {
            tracing::info!(
                video_id = %stored.id,
                file_name = %stored.file_name,
                size_bytes = stored.size_bytes,
                "Video uploaded"
            );
            Ok(Json(UploadResponse { id }))
        }
        Err(e) => {
            if let Err(cleanup_err) = state.store.abort(&id).await {
                tracing::warn!(
                    error = %cleanup_err,
                    video_id = %id,
                    "Failed to discard staged upload"
                );
            }
            Err(e)
        }
    }
}

/// Read the multipart body, streaming `file` into staging as it arrives, then commit.
/// Fields may come in either order; anything else in the form is ignored.
async fn receive_upload(
    state: &AppState,
    id: &VideoId,
    mut multipart: Multipart,
) -> Result<StoredVideo, HttpAppError> {
    let mut staged_bytes: Option<u64> = None;
    let mut metadata: Option<serde_json::Value> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FILE_FIELD => {
                if staged_bytes.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    )
                    .into());
                }
                let extension = upload_extension(&field);
                let size = state
                    .store
                    .stage_video(id, extension.as_deref(), field_reader(field))
                    .await?;
                staged_bytes = Some(size);
            }
            METADATA_FIELD => {
                if metadata.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple metadata fields are not allowed".to_string(),
                    )
                    .into());
                }
                let text = field.text().await?;
                metadata = Some(parse_metadata(&text)?);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let metadata = metadata
        .ok_or_else(|| AppError::InvalidInput("Missing 'metadata' field".to_string()))?;
    if staged_bytes.is_none() {
        return Err(AppError::InvalidInput("Missing 'file' field".to_string()).into());
    }

    Ok(state.store.commit(id, &metadata).await?)
}
