use crate::database::models::{CommentRecord, GroupRecord, PostRecord};
use crate::database::repositories::{
    AuthorRepository, CommentRepository, GroupRepository, PostRepository, SqliteRepositories,
};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("post not found")]
    PostNotFound,
    #[error("group not found")]
    UnknownGroup,
    #[error("post text may not be empty")]
    EmptyText,
    #[error("group slug is already taken")]
    SlugTaken,
    #[error("only the author may modify a post")]
    NotAuthor,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Post creation, editing, deletion, and commenting. Feeds live in
/// [`crate::feed::FeedService`]; this service owns the write side.
#[derive(Clone)]
pub struct PostService {
    database: Database,
}

impl PostService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, author_id: &str, input: PostInput) -> Result<PostView, PublishError> {
        if input.text.trim().is_empty() {
            return Err(PublishError::EmptyText);
        }

        let record = self.database.with_repositories(|repos| {
            let group_id = resolve_group(&repos, input.group.as_deref())?;
            let Some(group_id) = group_id else {
                return Ok(None);
            };
            let record = PostRecord {
                id: Uuid::new_v4().to_string(),
                author_id: author_id.to_string(),
                group_id,
                text: input.text.clone(),
                image_path: None,
                created_at: now_utc_iso(),
                updated_at: None,
            };
            repos.posts().create(&record)?;
            Ok(Some(record))
        })?;

        let record = record.ok_or(PublishError::UnknownGroup)?;
        self.view_of(record)
    }

    /// REDESIGN of the original behavior: an editor who is not the author
    /// gets an explicit NotAuthor error instead of a silent no-op.
    pub fn edit_post(
        &self,
        post_id: &str,
        editor_id: &str,
        input: PostInput,
    ) -> Result<PostView, PublishError> {
        if input.text.trim().is_empty() {
            return Err(PublishError::EmptyText);
        }

        let outcome = self.database.with_repositories(|repos| {
            let Some(mut record) = repos.posts().get(post_id)? else {
                return Ok(EditOutcome::Missing);
            };
            if record.author_id != editor_id {
                return Ok(EditOutcome::Rejected);
            }
            let Some(group_id) = resolve_group(&repos, input.group.as_deref())? else {
                return Ok(EditOutcome::BadGroup);
            };
            record.group_id = group_id;
            record.text = input.text.clone();
            record.updated_at = Some(now_utc_iso());
            repos.posts().update(&record)?;
            Ok(EditOutcome::Updated(record))
        })?;

        match outcome {
            EditOutcome::Updated(record) => self.view_of(record),
            EditOutcome::Missing => Err(PublishError::PostNotFound),
            EditOutcome::Rejected => Err(PublishError::NotAuthor),
            EditOutcome::BadGroup => Err(PublishError::UnknownGroup),
        }
    }

    /// Deletion is immediate; comments cascade away with the post.
    pub fn delete_post(&self, post_id: &str, editor_id: &str) -> Result<(), PublishError> {
        let outcome = self.database.with_repositories(|repos| {
            let Some(record) = repos.posts().get(post_id)? else {
                return Ok(EditOutcome::Missing);
            };
            if record.author_id != editor_id {
                return Ok(EditOutcome::Rejected);
            }
            repos.posts().delete(post_id)?;
            Ok(EditOutcome::Updated(record))
        })?;

        match outcome {
            EditOutcome::Updated(_) => Ok(()),
            EditOutcome::Missing => Err(PublishError::PostNotFound),
            EditOutcome::Rejected => Err(PublishError::NotAuthor),
            EditOutcome::BadGroup => unreachable!("delete does not resolve groups"),
        }
    }

    /// The post plus its active comments, oldest comment first.
    pub fn post_detail(&self, post_id: &str) -> Result<Option<PostDetails>> {
        self.database.with_repositories(|repos| {
            let Some(record) = repos.posts().get(post_id)? else {
                return Ok(None);
            };
            let comments = repos.comments().list_active_for_post(post_id)?;
            let mut usernames = UsernameCache::default();
            let comment_views = comments
                .into_iter()
                .map(|comment| {
                    let author = usernames.resolve(&repos, &comment.author_id)?;
                    Ok(CommentView::from_record(comment, author))
                })
                .collect::<Result<Vec<_>>>()?;
            let post = build_post_view(&repos, record)?;
            Ok(Some(PostDetails {
                post,
                comments: comment_views,
            }))
        })
    }

    pub fn add_comment(
        &self,
        post_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<CommentView, PublishError> {
        if text.trim().is_empty() {
            return Err(PublishError::EmptyText);
        }
        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            text: text.to_string(),
            active: true,
            created_at: now_utc_iso(),
        };

        let stored = self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                return Ok(None);
            }
            repos.comments().create(&record)?;
            let author = repos
                .authors()
                .get(author_id)?
                .map(|author| author.username)
                .unwrap_or_default();
            Ok(Some(author))
        })?;

        match stored {
            Some(author) => Ok(CommentView::from_record(record, author)),
            None => Err(PublishError::PostNotFound),
        }
    }

    pub fn create_group(&self, input: GroupInput) -> Result<GroupView, PublishError> {
        let slug = input.slug.trim().to_lowercase();
        if slug.is_empty() || input.title.trim().is_empty() {
            return Err(PublishError::EmptyText);
        }
        let record = GroupRecord {
            id: Uuid::new_v4().to_string(),
            slug,
            title: input.title,
            description: input.description,
            created_at: now_utc_iso(),
        };

        let created = self.database.with_repositories(|repos| {
            if repos.groups().get_by_slug(&record.slug)?.is_some() {
                return Ok(false);
            }
            repos.groups().create(&record)?;
            Ok(true)
        })?;

        if !created {
            return Err(PublishError::SlugTaken);
        }
        Ok(GroupView::from_record(record))
    }

    pub fn list_groups(&self) -> Result<Vec<GroupView>> {
        self.database.with_repositories(|repos| {
            let groups = repos.groups().list()?;
            Ok(groups.into_iter().map(GroupView::from_record).collect())
        })
    }

    fn view_of(&self, record: PostRecord) -> Result<PostView, PublishError> {
        let view = self
            .database
            .with_repositories(|repos| build_post_view(&repos, record))?;
        Ok(view)
    }
}

enum EditOutcome {
    Updated(PostRecord),
    Missing,
    Rejected,
    BadGroup,
}

/// Maps an optional group slug to Some(group id). The outer None means
/// the slug did not resolve.
fn resolve_group(
    repos: &SqliteRepositories<'_>,
    slug: Option<&str>,
) -> Result<Option<Option<String>>> {
    match slug {
        None => Ok(Some(None)),
        Some(slug) => Ok(repos
            .groups()
            .get_by_slug(slug)?
            .map(|group| Some(group.id))),
    }
}

#[derive(Default)]
pub(crate) struct UsernameCache {
    known: HashMap<String, String>,
}

impl UsernameCache {
    pub(crate) fn resolve(
        &mut self,
        repos: &SqliteRepositories<'_>,
        author_id: &str,
    ) -> Result<String> {
        if let Some(name) = self.known.get(author_id) {
            return Ok(name.clone());
        }
        let name = repos
            .authors()
            .get(author_id)?
            .map(|author| author.username)
            .unwrap_or_default();
        self.known.insert(author_id.to_string(), name.clone());
        Ok(name)
    }
}

pub(crate) fn build_post_view(
    repos: &SqliteRepositories<'_>,
    record: PostRecord,
) -> Result<PostView> {
    let mut usernames = UsernameCache::default();
    build_post_view_with(repos, record, &mut usernames, &mut HashMap::new())
}

pub(crate) fn build_post_views(
    repos: &SqliteRepositories<'_>,
    records: Vec<PostRecord>,
) -> Result<Vec<PostView>> {
    let mut usernames = UsernameCache::default();
    let mut group_slugs = HashMap::new();
    records
        .into_iter()
        .map(|record| build_post_view_with(repos, record, &mut usernames, &mut group_slugs))
        .collect()
}

fn build_post_view_with(
    repos: &SqliteRepositories<'_>,
    record: PostRecord,
    usernames: &mut UsernameCache,
    group_slugs: &mut HashMap<String, Option<String>>,
) -> Result<PostView> {
    let author = usernames.resolve(repos, &record.author_id)?;
    let group = match &record.group_id {
        None => None,
        Some(group_id) => {
            if let Some(slug) = group_slugs.get(group_id) {
                slug.clone()
            } else {
                let slug = repos.groups().get(group_id)?.map(|group| group.slug);
                group_slugs.insert(group_id.clone(), slug.clone());
                slug
            }
        }
    };
    Ok(PostView::from_record(record, author, group))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub author: String,
    pub group: Option<String>,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl PostView {
    fn from_record(record: PostRecord, author: String, group: Option<String>) -> Self {
        let image_url = record
            .image_path
            .as_ref()
            .map(|_| format!("/posts/{}/image", record.id));
        Self {
            id: record.id,
            author,
            group,
            text: record.text,
            image_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub text: String,
    pub created_at: String,
}

impl CommentView {
    fn from_record(record: CommentRecord, author: String) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            author,
            text: record.text,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetails {
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupView {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

impl GroupView {
    pub(crate) fn from_record(record: GroupRecord) -> Self {
        Self {
            slug: record.slug,
            title: record.title,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInput {
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::AuthorRecord;
    use crate::database::repositories::AuthorRepository;
    use crate::database::Database;

    fn setup() -> (PostService, Database) {
        let db = crate::database::open_in_memory();
        (PostService::new(db.clone()), db)
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
    fn create_and_fetch_post_with_group() {
        let (service, db) = setup();
        seed_author(&db, "author-1", "leo");
        service
            .create_group(GroupInput {
                slug: "letters".into(),
                title: "Letters".into(),
                description: "Long-form letters".into(),
            })
            .unwrap();

        let post = service
            .create_post(
                "author-1",
                PostInput {
                    text: "First entry".into(),
                    group: Some("letters".into()),
                },
            )
            .unwrap();
        assert_eq!(post.author, "leo");
        assert_eq!(post.group.as_deref(), Some("letters"));

        let detail = service.post_detail(&post.id).unwrap().unwrap();
        assert_eq!(detail.post.text, "First entry");
        assert!(detail.comments.is_empty());
    }

    #[test]
    fn empty_text_and_unknown_group_are_rejected() {
        let (service, db) = setup();
        seed_author(&db, "author-1", "leo");
        assert!(matches!(
            service.create_post(
                "author-1",
                PostInput {
                    text: "   ".into(),
                    group: None
                }
            ),
            Err(PublishError::EmptyText)
        ));
        assert!(matches!(
            service.create_post(
                "author-1",
                PostInput {
                    text: "hello".into(),
                    group: Some("missing".into())
                }
            ),
            Err(PublishError::UnknownGroup)
        ));
    }

    #[test]
    fn only_the_author_may_edit_or_delete() {
        let (service, db) = setup();
        seed_author(&db, "author-1", "leo");
        seed_author(&db, "author-2", "sofia");

        let post = service
            .create_post(
                "author-1",
                PostInput {
                    text: "Original".into(),
                    group: None,
                },
            )
            .unwrap();

        assert!(matches!(
            service.edit_post(
                &post.id,
                "author-2",
                PostInput {
                    text: "Hijacked".into(),
                    group: None
                }
            ),
            Err(PublishError::NotAuthor)
        ));
        assert!(matches!(
            service.delete_post(&post.id, "author-2"),
            Err(PublishError::NotAuthor)
        ));

        let edited = service
            .edit_post(
                &post.id,
                "author-1",
                PostInput {
                    text: "Revised".into(),
                    group: None,
                },
            )
            .unwrap();
        assert_eq!(edited.text, "Revised");
        assert!(edited.updated_at.is_some());

        service.delete_post(&post.id, "author-1").unwrap();
        assert!(service.post_detail(&post.id).unwrap().is_none());
        assert!(matches!(
            service.delete_post(&post.id, "author-1"),
            Err(PublishError::PostNotFound)
        ));
    }

    #[test]
    fn comments_attach_to_existing_posts_only() {
        let (service, db) = setup();
        seed_author(&db, "author-1", "leo");
        seed_author(&db, "reader", "anna");

        let post = service
            .create_post(
                "author-1",
                PostInput {
                    text: "Discuss".into(),
                    group: None,
                },
            )
            .unwrap();

        let comment = service.add_comment(&post.id, "reader", "Well said").unwrap();
        assert_eq!(comment.author, "anna");

        let detail = service.post_detail(&post.id).unwrap().unwrap();
        assert_eq!(detail.comments.len(), 1);

        assert!(matches!(
            service.add_comment("missing-post", "reader", "hello"),
            Err(PublishError::PostNotFound)
        ));
        assert!(matches!(
            service.add_comment(&post.id, "reader", "  "),
            Err(PublishError::EmptyText)
        ));
    }

    #[test]
    fn duplicate_group_slug_is_rejected() {
        let (service, _db) = setup();
        service
            .create_group(GroupInput {
                slug: "Letters".into(),
                title: "Letters".into(),
                description: String::new(),
            })
            .unwrap();
        assert!(service
            .create_group(GroupInput {
                slug: "letters".into(),
                title: "Again".into(),
                description: String::new(),
            })
            .is_err());
        assert_eq!(service.list_groups().unwrap().len(), 1);
    }
}
