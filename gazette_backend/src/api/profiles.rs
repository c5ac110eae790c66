use super::auth::{current_viewer, require_viewer};
use super::feed::PageParams;
use super::{ApiError, ApiResult, AppState};
use crate::auth::AuthorSummary;
use crate::feed::FeedService;
use crate::pagination::{paginate, Page, PageNumber};
use crate::publishing::PostView;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ProfileResponse {
    author: AuthorSummary,
    followers: usize,
    follows: usize,
    /// Whether the requesting viewer follows this author. Always false
    /// for anonymous viewers and for an author's own profile.
    following: bool,
    page: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FollowStateResponse {
    following: bool,
}

pub(crate) async fn profile_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
    headers: HeaderMap,
) -> ApiResult<ProfileResponse> {
    let service = FeedService::new(state.database.clone());
    let feed = service
        .author_feed(&username)?
        .ok_or_else(|| ApiError::NotFound(format!("author {username} not found")))?;

    let following = match current_viewer(&state, &headers)? {
        Some(viewer) => service.is_following(&viewer.id, &username)?,
        None => false,
    };

    let page = paginate(
        feed.posts,
        PageNumber::from_query(params.page.as_deref()),
        state.config.feed.page_size,
    );
    Ok(Json(ProfileResponse {
        author: feed.author,
        followers: feed.followers,
        follows: feed.following,
        following,
        page,
    }))
}

pub(crate) async fn follow_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> ApiResult<FollowStateResponse> {
    let viewer = require_viewer(&state, &headers, uri.path())?;
    let following = FeedService::new(state.database.clone()).follow(&viewer.id, &username)?;
    Ok(Json(FollowStateResponse { following }))
}

pub(crate) async fn unfollow_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> ApiResult<FollowStateResponse> {
    let viewer = require_viewer(&state, &headers, uri.path())?;
    let following = FeedService::new(state.database.clone()).unfollow(&viewer.id, &username)?;
    Ok(Json(FollowStateResponse { following }))
}
