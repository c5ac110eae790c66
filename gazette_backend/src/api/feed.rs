use super::auth::require_viewer;
use super::{ApiError, AppState};
use crate::feed::FeedService;
use crate::pagination::{paginate, Page, PageNumber};
use crate::publishing::PostView;
use anyhow::Context;
use axum::extract::{OriginalUri, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Raw `page` value; kept as a string so non-numeric input flows into
/// the composer's clamping rules instead of failing extraction.
#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default)]
    pub(crate) page: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeedPageResponse {
    pub(crate) page: Page<PostView>,
}

/// The home feed is served through the coarse TTL cache: reads within
/// the window may be stale, matching the page-cache semantics of the
/// original application.
pub(crate) async fn home_feed_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let requested = PageNumber::from_query(params.page.as_deref());
    if let Some(key) = lookup_key(requested) {
        if let Some(body) = state.cache.get(&key) {
            return Ok(json_response(body));
        }
    }

    let posts = FeedService::new(state.database.clone()).home_feed()?;
    let page = paginate(posts, requested, state.config.feed.page_size);
    // Entries are stored under the clamped page number only, keeping the
    // key space within the valid page range no matter what the query said.
    let store_key = format!("home:{}", page.number);
    let body = serde_json::to_string(&FeedPageResponse { page })
        .context("failed to serialize home feed")?;
    state.cache.put(&store_key, body.clone());
    Ok(json_response(body))
}

fn lookup_key(requested: PageNumber) -> Option<String> {
    match requested {
        PageNumber::Default => Some("home:1".to_string()),
        PageNumber::Requested(n) if n >= 1 => Some(format!("home:{n}")),
        PageNumber::Requested(_) => None,
    }
}

pub(crate) async fn following_feed_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Json<FeedPageResponse>, ApiError> {
    let viewer = require_viewer(&state, &headers, uri.path())?;
    let posts = FeedService::new(state.database.clone()).following_feed(&viewer.id)?;
    let page = paginate(
        posts,
        PageNumber::from_query(params.page.as_deref()),
        state.config.feed.page_size,
    );
    Ok(Json(FeedPageResponse { page }))
}

fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PageCache;
    use crate::config::{FeedConfig, GazetteConfig, GazettePaths};
    use std::time::Duration;

    fn test_state() -> AppState {
        let paths = GazettePaths::from_base_dir(std::env::temp_dir()).expect("paths");
        let feed = FeedConfig {
            page_size: 10,
            index_cache_ttl: Duration::from_secs(60),
        };
        let config = GazetteConfig::with_feed(0, paths, feed.clone());
        AppState {
            config,
            database: crate::database::open_in_memory(),
            cache: PageCache::new(feed.index_cache_ttl),
        }
    }

    #[tokio::test]
    async fn junk_page_values_share_one_cache_entry() {
        let state = test_state();
        let queries = [
            None,
            Some("banana"),
            Some("-3"),
            Some("0"),
            Some("99"),
            Some("9999999999999999999999"),
        ];
        for query in queries {
            let params = PageParams {
                page: query.map(str::to_string),
            };
            home_feed_handler(State(state.clone()), Query(params))
                .await
                .expect("feed response");
        }
        // Every request clamps to the single valid page of an empty feed.
        assert_eq!(state.cache.entry_count(), 1);
    }
}
