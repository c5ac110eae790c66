use crate::config::GazettePaths;
use crate::database::repositories::PostRepository;
use crate::database::Database;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("post not found")]
    PostNotFound,
    #[error("only the author may attach an image")]
    NotAuthor,
    #[error("upload is not a recognized image")]
    NotAnImage,
    #[error("image data may not be empty")]
    Empty,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Stores the optional image attachment of a post on disk and records
/// its relative path on the post row.
#[derive(Clone)]
pub struct ImageService {
    database: Database,
    paths: GazettePaths,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub post_id: String,
    pub mime: String,
    pub size_bytes: i64,
    pub download_url: String,
}

#[derive(Debug, Clone)]
pub struct ImageDownload {
    pub absolute_path: PathBuf,
    pub mime: String,
}

impl ImageService {
    pub fn new(database: Database, paths: GazettePaths) -> Self {
        Self { database, paths }
    }

    pub async fn attach_image(
        &self,
        post_id: &str,
        editor_id: &str,
        data: Vec<u8>,
    ) -> Result<ImageView, ImageError> {
        if data.is_empty() {
            return Err(ImageError::Empty);
        }
        let Some(kind) = infer::get(&data).filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        else {
            return Err(ImageError::NotAnImage);
        };

        let post = self
            .database
            .with_repositories(|repos| repos.posts().get(post_id))?
            .ok_or(ImageError::PostNotFound)?;
        if post.author_id != editor_id {
            return Err(ImageError::NotAuthor);
        }

        let stored_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        let relative_path = format!("uploads/{stored_name}");
        let absolute_path = self.paths.base.join(&relative_path);
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create upload directory {}", parent.display())
            })?;
        }
        fs::write(&absolute_path, &data).await.with_context(|| {
            format!("failed to write image to {}", absolute_path.display())
        })?;

        self.database
            .with_repositories(|repos| repos.posts().set_image_path(post_id, &relative_path))?;

        // The row now points at the new file; the replaced one is removed.
        if let Some(previous) = post.image_path {
            let stale = self.paths.base.join(&previous);
            if let Err(err) = fs::remove_file(&stale).await {
                tracing::warn!(path = %stale.display(), %err, "failed to remove replaced image");
            }
        }

        Ok(ImageView {
            post_id: post_id.to_string(),
            mime: kind.mime_type().to_string(),
            size_bytes: data.len() as i64,
            download_url: format!("/posts/{post_id}/image"),
        })
    }

    pub async fn open_image(&self, post_id: &str) -> Result<Option<ImageDownload>> {
        let post = self
            .database
            .with_repositories(|repos| repos.posts().get(post_id))?;
        let Some(relative_path) = post.and_then(|post| post.image_path) else {
            return Ok(None);
        };
        let absolute_path = self.paths.base.join(&relative_path);
        if fs::metadata(&absolute_path).await.is_err() {
            tracing::warn!(path = %absolute_path.display(), "post image missing on disk");
            return Ok(None);
        }
        let mime = mime_for(&absolute_path);
        Ok(Some(ImageDownload {
            absolute_path,
            mime,
        }))
    }
}

fn mime_for(path: &Path) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
    .to_string()
}
