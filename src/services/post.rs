//! Post service
//!
//! Business rules for posts:
//! - only published posts are listed, in ascending ID order
//! - new posts belong to the creating blogger and start unpublished
//! - only a post's author may edit it
//! - title uniqueness comes from the database constraint; a violation is
//!   reported as `DuplicateTitle`, never pre-checked

use crate::db::is_unique_violation;
use crate::db::repositories::PostRepository;
use crate::models::{
    Blogger, CreatePostInput, FieldErrors, InvalidPage, PageNumber, PagedResult, Post,
    UpdatePostInput, DUPLICATE_TITLE_MESSAGE,
};
use anyhow::Context;
use std::sync::Arc;

/// Default number of posts per list page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found
    #[error("Post not found: {0}")]
    NotFound(i64),

    /// Requested list page does not exist
    #[error("Invalid page: {0}")]
    InvalidPage(#[from] InvalidPage),

    /// Field-level validation failures
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// Another post already has this title
    #[error("Post title already exists: {0}")]
    DuplicateTitle(String),

    /// The acting blogger is not the post's author
    #[error("Blogger {blogger_id} is not the author of post {post_id}")]
    NotAuthor { post_id: i64, blogger_id: i64 },

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl PostServiceError {
    /// Errors that belong next to form fields, if this is one
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::DuplicateTitle(_) => Some(FieldErrors::single("title", DUPLICATE_TITLE_MESSAGE)),
            _ => None,
        }
    }
}

/// Post service for managing blog posts
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    page_size: u32,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self::with_page_size(repo, DEFAULT_PAGE_SIZE)
    }

    /// Create a service listing `page_size` posts per page
    pub fn with_page_size(repo: Arc<dyn PostRepository>, page_size: u32) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// One page of published posts.
    ///
    /// Fails with `InvalidPage` when the page is out of range; the first
    /// page always exists, even when there are no posts.
    pub async fn list_published(
        &self,
        page: PageNumber,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let total = self
            .repo
            .count_published()
            .await
            .context("Failed to count published posts")?;

        let params = page.resolve(total, self.page_size)?;

        let posts = self
            .repo
            .list_published(params.offset(), params.limit())
            .await
            .context("Failed to list published posts")?;

        Ok(PagedResult::new(posts, total, &params))
    }

    /// Get any post, published or not
    pub async fn get_by_id(&self, id: i64) -> Result<Post, PostServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound(id))
    }

    /// Create an unpublished post authored by `author`
    pub async fn create(
        &self,
        author: &Blogger,
        title: &str,
        body: &str,
    ) -> Result<Post, PostServiceError> {
        let input = CreatePostInput::new(title, body, author.id);
        input.validate().map_err(PostServiceError::Validation)?;

        let post = self
            .repo
            .create(&input)
            .await
            .map_err(|e| translate_write_error(e, &input.title))?;

        tracing::info!("Blogger {} created post {}", author.id, post.id);
        Ok(post)
    }

    /// Load a post for editing, checking that `editor` wrote it
    pub async fn get_for_edit(&self, id: i64, editor: &Blogger) -> Result<Post, PostServiceError> {
        let post = self.get_by_id(id).await?;
        if !editor.is_author_of(post.author_id) {
            tracing::debug!("Blogger {} may not edit post {}", editor.id, id);
            return Err(PostServiceError::NotAuthor {
                post_id: id,
                blogger_id: editor.id,
            });
        }
        Ok(post)
    }

    /// Overwrite title, body and published flag of a post written by `editor`.
    ///
    /// The author check runs before validation, so a non-author learns
    /// nothing about the submitted data.
    pub async fn update(
        &self,
        id: i64,
        editor: &Blogger,
        input: UpdatePostInput,
    ) -> Result<Post, PostServiceError> {
        self.get_for_edit(id, editor).await?;
        input.validate().map_err(PostServiceError::Validation)?;

        let post = self
            .repo
            .update(id, &input)
            .await
            .map_err(|e| translate_write_error(e, &input.title))?;

        tracing::info!(
            "Blogger {} updated post {} (published: {})",
            editor.id,
            post.id,
            post.published
        );
        Ok(post)
    }
}

fn translate_write_error(err: anyhow::Error, title: &str) -> PostServiceError {
    if is_unique_violation(&err) {
        PostServiceError::DuplicateTitle(title.to_string())
    } else {
        PostServiceError::InternalError(err)
    }
}
