use crate::auth::AuthorSummary;
use crate::database::models::FollowRecord;
use crate::database::repositories::{
    AuthorRepository, FollowRepository, GroupRepository, PostRepository,
};
use crate::database::Database;
use crate::publishing::{build_post_views, GroupView, PostView};
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("author not found")]
    UnknownAuthor,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Read-side feed composition plus the follow graph operations.
/// Every feed comes back reverse-chronological; pagination is applied
/// by the handlers through [`crate::pagination::paginate`].
#[derive(Clone)]
pub struct FeedService {
    database: Database,
}

/// A group page: the group itself plus its posts.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: GroupView,
    pub posts: Vec<PostView>,
}

/// A profile page: the author, follow counts, and their posts.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorFeed {
    pub author: AuthorSummary,
    pub followers: usize,
    pub following: usize,
    pub posts: Vec<PostView>,
}

impl FeedService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn home_feed(&self) -> Result<Vec<PostView>> {
        self.database.with_repositories(|repos| {
            let posts = repos.posts().list_recent()?;
            build_post_views(&repos, posts)
        })
    }

    pub fn group_feed(&self, slug: &str) -> Result<Option<GroupFeed>> {
        self.database.with_repositories(|repos| {
            let Some(group) = repos.groups().get_by_slug(slug)? else {
                return Ok(None);
            };
            let posts = repos.posts().list_for_group(&group.id)?;
            let posts = build_post_views(&repos, posts)?;
            Ok(Some(GroupFeed {
                group: GroupView::from_record(group),
                posts,
            }))
        })
    }

    pub fn author_feed(&self, username: &str) -> Result<Option<AuthorFeed>> {
        self.database.with_repositories(|repos| {
            let Some(author) = repos.authors().get_by_username(username)? else {
                return Ok(None);
            };
            let posts = repos.posts().list_for_author(&author.id)?;
            let posts = build_post_views(&repos, posts)?;
            let followers = repos.follows().count_followers(&author.id)?;
            let following = repos.follows().count_following(&author.id)?;
            Ok(Some(AuthorFeed {
                author: AuthorSummary::from_record(author),
                followers,
                following,
                posts,
            }))
        })
    }

    /// Posts by the authors the viewer follows. Empty when the viewer
    /// follows nobody; that is a valid feed, not an error.
    pub fn following_feed(&self, viewer_id: &str) -> Result<Vec<PostView>> {
        self.database.with_repositories(|repos| {
            let posts = repos.posts().list_followed(viewer_id)?;
            build_post_views(&repos, posts)
        })
    }

    /// Creates the follow edge. Re-following and self-following are
    /// silent no-ops; the returned flag is the resulting edge state.
    pub fn follow(&self, viewer_id: &str, username: &str) -> Result<bool, FeedError> {
        self.with_target(viewer_id, username, |repos, viewer_id, target_id| {
            repos.follows().follow(&FollowRecord {
                follower_id: viewer_id.to_string(),
                followed_id: target_id.to_string(),
                created_at: now_utc_iso(),
            })?;
            repos.follows().is_following(viewer_id, target_id)
        })
    }

    /// Removes the edge if present; a missing edge is a no-op.
    pub fn unfollow(&self, viewer_id: &str, username: &str) -> Result<bool, FeedError> {
        self.with_target(viewer_id, username, |repos, viewer_id, target_id| {
            repos.follows().unfollow(viewer_id, target_id)?;
            repos.follows().is_following(viewer_id, target_id)
        })
    }

    pub fn is_following(&self, viewer_id: &str, username: &str) -> Result<bool, FeedError> {
        self.with_target(viewer_id, username, |repos, viewer_id, target_id| {
            repos.follows().is_following(viewer_id, target_id)
        })
    }

    fn with_target<F>(&self, viewer_id: &str, username: &str, f: F) -> Result<bool, FeedError>
    where
        F: FnOnce(
            &crate::database::repositories::SqliteRepositories<'_>,
            &str,
            &str,
        ) -> Result<bool>,
    {
        let state = self.database.with_repositories(|repos| {
            let Some(target) = repos.authors().get_by_username(username)? else {
                return Ok(None);
            };
            f(&repos, viewer_id, &target.id).map(Some)
        })?;
        state.ok_or(FeedError::UnknownAuthor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::AuthorRecord;
    use crate::database::repositories::AuthorRepository;
    use crate::publishing::{PostInput, PostService};

    struct Fixture {
        feed: FeedService,
        posts: PostService,
        db: Database,
    }

    fn setup() -> Fixture {
        let db = crate::database::open_in_memory();
        Fixture {
            feed: FeedService::new(db.clone()),
            posts: PostService::new(db.clone()),
            db,
        }
    }

    fn seed_author(db: &Database, id: &str, username: &str) {
        db.with_repositories(|repos| {
            repos.authors().create(&AuthorRecord {
                id: id.into(),
                username: username.into(),
                password_hash: "hash".into(),
                bio: None,
                created_at: now_utc_iso(),
            })
        })
        .unwrap();
    }

    #[test]
    fn follow_is_idempotent_and_self_follow_never_creates_an_edge() {
        let fx = setup();
        seed_author(&fx.db, "viewer", "viewer");
        seed_author(&fx.db, "author-1", "author_1");

        assert!(fx.feed.follow("viewer", "author_1").unwrap());
        assert!(fx.feed.follow("viewer", "author_1").unwrap());
        fx.db
            .with_repositories(|repos| {
                assert_eq!(repos.follows().count_following("viewer").unwrap(), 1);
                Ok(())
            })
            .unwrap();

        assert!(!fx.feed.follow("viewer", "viewer").unwrap());
        fx.db
            .with_repositories(|repos| {
                assert_eq!(repos.follows().count_followers("viewer").unwrap(), 0);
                Ok(())
            })
            .unwrap();

        assert!(matches!(
            fx.feed.follow("viewer", "nobody"),
            Err(FeedError::UnknownAuthor)
        ));
    }

    #[test]
    fn unfollow_without_an_edge_is_a_no_op() {
        let fx = setup();
        seed_author(&fx.db, "viewer", "viewer");
        seed_author(&fx.db, "author-1", "author_1");

        assert!(!fx.feed.unfollow("viewer", "author_1").unwrap());
        assert!(!fx.feed.is_following("viewer", "author_1").unwrap());
    }

    #[test]
    fn following_feed_contains_only_followed_authors_in_order() {
        let fx = setup();
        seed_author(&fx.db, "viewer", "viewer");
        seed_author(&fx.db, "a", "author_a");
        seed_author(&fx.db, "b", "author_b");
        seed_author(&fx.db, "c", "author_c");

        for (author, text) in [("a", "from a"), ("b", "from b"), ("c", "from c")] {
            fx.posts
                .create_post(
                    author,
                    PostInput {
                        text: text.into(),
                        group: None,
                    },
                )
                .unwrap();
        }

        assert!(fx.feed.following_feed("viewer").unwrap().is_empty());

        fx.feed.follow("viewer", "author_a").unwrap();
        fx.feed.follow("viewer", "author_b").unwrap();

        let feed = fx.feed.following_feed("viewer").unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed
            .iter()
            .all(|post| post.author == "author_a" || post.author == "author_b"));
        // reverse-chronological: later posts first
        let home = fx.feed.home_feed().unwrap();
        assert_eq!(home[0].text, "from c");
        assert!(feed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[test]
    fn follow_then_unfollow_scenario() {
        let fx = setup();
        seed_author(&fx.db, "viewer", "viewer");
        seed_author(&fx.db, "author-1", "author_1");
        fx.posts
            .create_post(
                "author-1",
                PostInput {
                    text: "the only post".into(),
                    group: None,
                },
            )
            .unwrap();

        fx.feed.follow("viewer", "author_1").unwrap();
        let feed = fx.feed.following_feed("viewer").unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].text, "the only post");

        fx.feed.unfollow("viewer", "author_1").unwrap();
        assert!(fx.feed.following_feed("viewer").unwrap().is_empty());
    }

    #[test]
    fn group_and_author_feeds_resolve_or_return_none() {
        let fx = setup();
        seed_author(&fx.db, "author-1", "leo");

        assert!(fx.feed.group_feed("missing").unwrap().is_none());
        assert!(fx.feed.author_feed("nobody").unwrap().is_none());

        let profile = fx.feed.author_feed("leo").unwrap().unwrap();
        assert_eq!(profile.author.username, "leo");
        assert_eq!(profile.followers, 0);
        assert!(profile.posts.is_empty());
    }
}
