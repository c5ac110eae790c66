use super::auth::require_viewer;
use super::{ApiError, ApiResult, AppState};
use crate::publishing::{CommentView, PostDetails, PostInput, PostService, PostView};
use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct PostResponse {
    post: PostView,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentResponse {
    comment: CommentView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentRequest {
    text: String,
}

pub(crate) async fn create_post_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(payload): Json<PostInput>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let viewer = require_viewer(&state, &headers, uri.path())?;
    let service = PostService::new(state.database.clone());
    let post = service.create_post(&viewer.id, payload)?;
    Ok((StatusCode::CREATED, Json(PostResponse { post })))
}

pub(crate) async fn post_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PostDetails> {
    let service = PostService::new(state.database.clone());
    match service.post_detail(&id)? {
        Some(details) => Ok(Json(details)),
        None => Err(ApiError::NotFound(format!("post {id} not found"))),
    }
}

pub(crate) async fn edit_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(payload): Json<PostInput>,
) -> ApiResult<PostResponse> {
    let viewer = require_viewer(&state, &headers, uri.path())?;
    let service = PostService::new(state.database.clone());
    let post = service.edit_post(&id, &viewer.id, payload)?;
    Ok(Json(PostResponse { post }))
}

pub(crate) async fn delete_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let viewer = require_viewer(&state, &headers, uri.path())?;
    let service = PostService::new(state.database.clone());
    service.delete_post(&id, &viewer.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let viewer = require_viewer(&state, &headers, uri.path())?;
    let service = PostService::new(state.database.clone());
    let comment = service.add_comment(&id, &viewer.id, &payload.text)?;
    Ok((StatusCode::CREATED, Json(CommentResponse { comment })))
}
