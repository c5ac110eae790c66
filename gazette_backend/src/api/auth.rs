use super::{ApiError, ApiResult, AppState};
use crate::auth::{AuthService, AuthSession};
use crate::database::models::AuthorRecord;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialsRequest {
    username: String,
    password: String,
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let service = AuthService::new(state.database.clone());
    let session = service.register(&payload.username, &payload.password)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<AuthSession> {
    let service = AuthService::new(state.database.clone());
    let session = service.login(&payload.username, &payload.password)?;
    Ok(Json(session))
}

pub(crate) async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        AuthService::new(state.database.clone()).logout(&token)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// The viewer behind the request, if any. An invalid or absent token is
/// anonymous, not an error.
pub(crate) fn current_viewer(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<AuthorRecord>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let viewer = AuthService::new(state.database.clone()).resolve(&token)?;
    Ok(viewer)
}

/// Gate for mutating handlers: anonymous viewers are redirected to the
/// login entry point with the intended destination preserved.
pub(crate) fn require_viewer(
    state: &AppState,
    headers: &HeaderMap,
    destination: &str,
) -> Result<AuthorRecord, ApiError> {
    current_viewer(state, headers)?.ok_or_else(|| ApiError::Unauthenticated {
        next: destination.to_string(),
    })
}
