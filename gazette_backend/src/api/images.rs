use super::auth::require_viewer;
use super::{ApiError, AppState};
use crate::images::{ImageService, ImageView};
use anyhow::Context;
use axum::extract::{Multipart, OriginalUri, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::fs;

/// Accepts the first file field of the multipart body; any field name
/// is fine, matching the loose form contract of the original pages.
pub(crate) async fn upload_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageView>), ApiError> {
    let viewer = require_viewer(&state, &headers, uri.path())?;

    let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    else {
        return Err(ApiError::BadRequest("no file in upload".into()));
    };
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?
        .to_vec();

    let service = ImageService::new(state.database.clone(), state.config.paths.clone());
    let view = service.attach_image(&id, &viewer.id, data).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn download_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let service = ImageService::new(state.database.clone(), state.config.paths.clone());
    let Some(download) = service.open_image(&id).await? else {
        return Err(ApiError::NotFound(format!("post {id} has no image")));
    };
    let body = fs::read(&download.absolute_path)
        .await
        .with_context(|| format!("failed to read {}", download.absolute_path.display()))?;
    Ok(([(header::CONTENT_TYPE, download.mime)], body).into_response())
}
