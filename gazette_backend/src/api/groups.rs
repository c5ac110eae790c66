use super::auth::require_viewer;
use super::feed::PageParams;
use super::{ApiError, ApiResult, AppState};
use crate::feed::FeedService;
use crate::pagination::{paginate, Page, PageNumber};
use crate::publishing::{GroupInput, GroupView, PostService, PostView};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct GroupListResponse {
    groups: Vec<GroupView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupResponse {
    group: GroupView,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupFeedResponse {
    group: GroupView,
    page: Page<PostView>,
}

pub(crate) async fn list_groups_handler(
    State(state): State<AppState>,
) -> ApiResult<GroupListResponse> {
    let groups = PostService::new(state.database.clone()).list_groups()?;
    Ok(Json(GroupListResponse { groups }))
}

pub(crate) async fn create_group_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(payload): Json<GroupInput>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    require_viewer(&state, &headers, uri.path())?;
    let group = PostService::new(state.database.clone()).create_group(payload)?;
    Ok((StatusCode::CREATED, Json(GroupResponse { group })))
}

pub(crate) async fn group_feed_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<GroupFeedResponse> {
    let feed = FeedService::new(state.database.clone())
        .group_feed(&slug)?
        .ok_or_else(|| ApiError::NotFound(format!("group {slug} not found")))?;
    let page = paginate(
        feed.posts,
        PageNumber::from_query(params.page.as_deref()),
        state.config.feed.page_size,
    );
    Ok(Json(GroupFeedResponse {
        group: feed.group,
        page,
    }))
}
