//! Post repository
//!
//! Database operations for posts. Title uniqueness is left to the database:
//! a conflicting `create` or `update` fails with a unique-violation error
//! that callers detect with [`crate::db::is_unique_violation`].

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreatePostInput, Post, UpdatePostInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new, unpublished post
    async fn create(&self, input: &CreatePostInput) -> Result<Post>;

    /// Get post by ID, published or not
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Overwrite title, body and published flag. `pub_date` is left alone.
    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Post>;

    /// List published posts in ascending ID order
    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Post>>;

    /// Count published posts
    async fn count_published(&self) -> Result<i64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, input: &CreatePostInput) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_post_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_post_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_post_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(self.pool.sqlite()?, id, input).await,
            DatabaseDriver::Mysql => update_post_mysql(self.pool.mysql()?, id, input).await,
        }
    }

    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_published_posts_sqlite(self.pool.sqlite()?, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_published_posts_mysql(self.pool.mysql()?, offset, limit).await
            }
        }
    }

    async fn count_published(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_published_posts_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => count_published_posts_mysql(self.pool.mysql()?).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, input: &CreatePostInput) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, body, author_id, pub_date, published)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(input.author_id)
    .bind(now)
    .bind(false)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        body: input.body.clone(),
        author_id: input.author_id,
        pub_date: now,
        published: false,
    })
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, body, author_id, pub_date, published
        FROM posts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get post by ID")?;

    Ok(row.as_ref().map(row_to_post_sqlite))
}

async fn update_post_sqlite(pool: &SqlitePool, id: i64, input: &UpdatePostInput) -> Result<Post> {
    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, body = ?, published = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(input.published)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn list_published_posts_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, body, author_id, pub_date, published
        FROM posts
        WHERE published = 1
        ORDER BY id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list published posts")?;

    Ok(rows.iter().map(row_to_post_sqlite).collect())
}

async fn count_published_posts_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE published = 1")
        .fetch_one(pool)
        .await
        .context("Failed to count published posts")?;

    Ok(row.get("count"))
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        author_id: row.get("author_id"),
        pub_date: row.get("pub_date"),
        published: row.get("published"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, input: &CreatePostInput) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, body, author_id, pub_date, published)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(input.author_id)
    .bind(now)
    .bind(false)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        body: input.body.clone(),
        author_id: input.author_id,
        pub_date: now,
        published: false,
    })
}

async fn get_post_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, body, author_id, pub_date, published
        FROM posts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get post by ID")?;

    Ok(row.as_ref().map(row_to_post_mysql))
}

async fn update_post_mysql(pool: &MySqlPool, id: i64, input: &UpdatePostInput) -> Result<Post> {
    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, body = ?, published = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(input.published)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn list_published_posts_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, body, author_id, pub_date, published
        FROM posts
        WHERE published = TRUE
        ORDER BY id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list published posts")?;

    Ok(rows.iter().map(row_to_post_mysql).collect())
}

async fn count_published_posts_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE published = TRUE")
        .fetch_one(pool)
        .await
        .context("Failed to count published posts")?;

    Ok(row.get("count"))
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        author_id: row.get("author_id"),
        pub_date: row.get("pub_date"),
        published: row.get("published"),
    }
}
