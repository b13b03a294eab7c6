//! Comment service

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, CommentWithAuthor, CreateCommentInput, REQUIRED_MESSAGE};
use anyhow::Context;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// The post being commented on does not exist
    #[error("Post not found: {0}")]
    PostNotFound(i64),

    /// Validation error (empty body)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        post_repo: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    /// Add a comment by `author_id` to a post
    pub async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        body: &str,
    ) -> Result<Comment, CommentServiceError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CommentServiceError::ValidationError(REQUIRED_MESSAGE.to_string()));
        }

        if self
            .post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .is_none()
        {
            return Err(CommentServiceError::PostNotFound(post_id));
        }

        let comment = self
            .comment_repo
            .create(&CreateCommentInput {
                post_id,
                author_id,
                body: body.to_string(),
            })
            .await
            .context("Failed to create comment")?;

        tracing::debug!("Blogger {} commented on post {}", author_id, post_id);
        Ok(comment)
    }

    /// Comments on a post, oldest first
    pub async fn list_for_post(
        &self,
        post_id: i64,
    ) -> Result<Vec<CommentWithAuthor>, CommentServiceError> {
        Ok(self
            .comment_repo
            .list_by_post(post_id)
            .await
            .context("Failed to list comments")?)
    }
}
