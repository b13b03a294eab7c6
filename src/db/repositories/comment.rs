//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor, CreateCommentInput};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment. Fails if the post or author does not exist.
    async fn create(&self, input: &CreateCommentInput) -> Result<Comment>;

    /// Comments on a post, oldest first, with author emails
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>>;
}

/// Comment repository implementation
pub struct CommentRepositoryImpl {
    pool: DynDatabasePool,
}

impl CommentRepositoryImpl {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for CommentRepositoryImpl {
    async fn create(&self, input: &CreateCommentInput) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_post_sqlite(self.pool.sqlite()?, post_id).await,
            DatabaseDriver::Mysql => list_by_post_mysql(self.pool.mysql()?, post_id).await,
        }
    }
}

const LIST_BY_POST: &str = r#"
    SELECT c.id, c.post_id, c.author_id, c.body, c.pub_date, b.email AS author_email
    FROM comments c
    JOIN bloggers b ON b.id = c.author_id
    WHERE c.post_id = ?
    ORDER BY c.pub_date ASC, c.id ASC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateCommentInput) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (post_id, author_id, body, pub_date) VALUES (?, ?, ?, ?)",
    )
    .bind(input.post_id)
    .bind(input.author_id)
    .bind(&input.body)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        post_id: input.post_id,
        author_id: input.author_id,
        body: input.body.clone(),
        pub_date: now,
    })
}

async fn list_by_post_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_BY_POST)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: Comment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                body: row.get("body"),
                pub_date: row.get("pub_date"),
            },
            author_email: row.get("author_email"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateCommentInput) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (post_id, author_id, body, pub_date) VALUES (?, ?, ?, ?)",
    )
    .bind(input.post_id)
    .bind(input.author_id)
    .bind(&input.body)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        post_id: input.post_id,
        author_id: input.author_id,
        body: input.body.clone(),
        pub_date: now,
    })
}

async fn list_by_post_mysql(pool: &MySqlPool, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_BY_POST)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: Comment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                body: row.get("body"),
                pub_date: row.get("pub_date"),
            },
            author_email: row.get("author_email"),
        })
        .collect())
}
