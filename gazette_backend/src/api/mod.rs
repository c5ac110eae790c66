mod auth;
mod feed;
mod groups;
mod images;
mod posts;
mod profiles;

use crate::auth::AuthError;
use crate::cache::PageCache;
use crate::config::GazetteConfig;
use crate::database::Database;
use crate::feed::FeedError;
use crate::images::ImageError;
use crate::publishing::PublishError;
use anyhow::Result;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: GazetteConfig,
    pub database: Database,
    pub cache: PageCache,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    /// Mutating access without identity: redirect to the login entry
    /// point, preserving the originally intended destination.
    Unauthenticated {
        next: String,
    },
    Forbidden(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message: msg })).into_response()
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(ErrorResponse { message: msg })).into_response()
            }
            ApiError::Unauthenticated { next } => {
                Redirect::to(&format!("/auth/login?next={next}")).into_response()
            }
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(ErrorResponse { message: msg })).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message: msg })).into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        message: "internal server error".into(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::PostNotFound | PublishError::UnknownGroup => {
                ApiError::NotFound(err.to_string())
            }
            PublishError::EmptyText | PublishError::SlugTaken => {
                ApiError::BadRequest(err.to_string())
            }
            PublishError::NotAuthor => ApiError::Forbidden(err.to_string()),
            PublishError::Storage(inner) => ApiError::Internal(inner),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::UnknownAuthor => ApiError::NotFound(err.to_string()),
            FeedError::Storage(inner) => ApiError::Internal(inner),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyUsername | AuthError::WeakPassword | AuthError::UsernameTaken => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::Storage(inner) => ApiError::Internal(inner),
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::PostNotFound => ApiError::NotFound(err.to_string()),
            ImageError::NotAuthor => ApiError::Forbidden(err.to_string()),
            ImageError::NotAnImage | ImageError::Empty => ApiError::BadRequest(err.to_string()),
            ImageError::Storage(inner) => ApiError::Internal(inner),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
    })
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        // The scan stops at u16::MAX instead of wrapping around.
        let Some(port) = start_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
    )
}

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.upload.max_upload_bytes;
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/posts", get(feed::home_feed_handler).post(posts::create_post_handler))
        .route(
            "/posts/:id",
            get(posts::post_detail_handler)
                .put(posts::edit_post_handler)
                .delete(posts::delete_post_handler),
        )
        .route("/posts/:id/comments", post(posts::add_comment_handler))
        .route(
            "/posts/:id/image",
            get(images::download_image_handler).post(images::upload_image_handler),
        )
        .route("/groups", get(groups::list_groups_handler).post(groups::create_group_handler))
        .route("/groups/:slug/posts", get(groups::group_feed_handler))
        .route("/authors/:username", get(profiles::profile_handler))
        .route("/authors/:username/follow", post(profiles::follow_handler))
        .route("/authors/:username/unfollow", post(profiles::unfollow_handler))
        .route("/feed/following", get(feed::following_feed_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes as usize))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn serve_http(config: GazetteConfig, database: Database) -> Result<()> {
    let cache = PageCache::new(config.feed.index_cache_ttl);
    let state = AppState {
        config: config.clone(),
        database,
        cache,
    };

    let app = router(state);

    let (listener, actual_port) = find_available_port(config.api_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn port_scan_does_not_overflow_past_u16_max() {
        // Hold the last port so the scan has to walk past it.
        let _guard = std::net::TcpListener::bind(("0.0.0.0", u16::MAX));
        if let Ok((_, port)) = find_available_port(u16::MAX).await {
            assert_eq!(port, u16::MAX);
        }
    }
}
