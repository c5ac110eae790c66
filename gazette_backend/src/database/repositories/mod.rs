mod authors;
mod comments;
mod follows;
mod groups;
mod posts;
mod sessions;

use super::models::{
    AuthorRecord, CommentRecord, FollowRecord, GroupRecord, PostRecord, SessionRecord,
};
use anyhow::Result;
use rusqlite::Connection;

pub trait AuthorRepository {
    fn create(&self, record: &AuthorRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<AuthorRecord>>;
    fn get_by_username(&self, username: &str) -> Result<Option<AuthorRecord>>;
}

pub trait SessionRepository {
    fn create(&self, record: &SessionRecord) -> Result<()>;
    fn get(&self, token: &str) -> Result<Option<SessionRecord>>;
    fn delete(&self, token: &str) -> Result<()>;
}

pub trait GroupRepository {
    fn create(&self, record: &GroupRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<GroupRecord>>;
    fn get_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>>;
    fn list(&self) -> Result<Vec<GroupRecord>>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn update(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn delete(&self, id: &str) -> Result<()>;
    fn set_image_path(&self, id: &str, image_path: &str) -> Result<()>;
    /// All posts, newest first.
    fn list_recent(&self) -> Result<Vec<PostRecord>>;
    fn list_for_group(&self, group_id: &str) -> Result<Vec<PostRecord>>;
    fn list_for_author(&self, author_id: &str) -> Result<Vec<PostRecord>>;
    /// Posts whose author the viewer follows, newest first.
    fn list_followed(&self, follower_id: &str) -> Result<Vec<PostRecord>>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn list_active_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
}

pub trait FollowRepository {
    /// Idempotent; duplicate edges and self-follows are silent no-ops.
    fn follow(&self, record: &FollowRecord) -> Result<()>;
    /// No-op when the edge does not exist.
    fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()>;
    fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool>;
    fn list_for_follower(&self, follower_id: &str) -> Result<Vec<FollowRecord>>;
    fn count_followers(&self, author_id: &str) -> Result<usize>;
    fn count_following(&self, author_id: &str) -> Result<usize>;
}

/// Per-entity repository handles bound to one borrowed connection.
pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn authors(&self) -> impl AuthorRepository + '_ {
        authors::SqliteAuthorRepository { conn: self.conn }
    }

    pub fn sessions(&self) -> impl SessionRepository + '_ {
        sessions::SqliteSessionRepository { conn: self.conn }
    }

    pub fn groups(&self) -> impl GroupRepository + '_ {
        groups::SqliteGroupRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn follows(&self) -> impl FollowRepository + '_ {
        follows::SqliteFollowRepository { conn: self.conn }
    }
}
