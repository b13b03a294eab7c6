//! Blogger repository
//!
//! Database operations for blogger accounts.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Blogger;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Blogger repository trait
#[async_trait]
pub trait BloggerRepository: Send + Sync {
    /// Insert a new blogger; the stored row's ID is returned in the result
    async fn create(&self, blogger: &Blogger) -> Result<Blogger>;

    /// Get blogger by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Blogger>>;

    /// Get blogger by (normalised) email
    async fn get_by_email(&self, email: &str) -> Result<Option<Blogger>>;

    /// Delete a blogger together with everything they authored
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based blogger repository implementation
pub struct SqlxBloggerRepository {
    pool: DynDatabasePool,
}

impl SqlxBloggerRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BloggerRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BloggerRepository for SqlxBloggerRepository {
    async fn create(&self, blogger: &Blogger) -> Result<Blogger> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_blogger_sqlite(self.pool.sqlite()?, blogger).await,
            DatabaseDriver::Mysql => create_blogger_mysql(self.pool.mysql()?, blogger).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blogger>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_blogger_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_blogger_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Blogger>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_blogger_by_email_sqlite(self.pool.sqlite()?, email).await
            }
            DatabaseDriver::Mysql => get_blogger_by_email_mysql(self.pool.mysql()?, email).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_blogger_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_blogger_mysql(self.pool.mysql()?, id).await,
        }
    }
}

const SELECT_BLOGGER: &str = r#"
    SELECT id, email, password_hash, is_staff, is_superuser, is_active, date_joined
    FROM bloggers
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_blogger_sqlite(pool: &SqlitePool, blogger: &Blogger) -> Result<Blogger> {
    let result = sqlx::query(
        r#"
        INSERT INTO bloggers (email, password_hash, is_staff, is_superuser, is_active, date_joined)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&blogger.email)
    .bind(&blogger.password_hash)
    .bind(blogger.is_staff)
    .bind(blogger.is_superuser)
    .bind(blogger.is_active)
    .bind(blogger.date_joined)
    .execute(pool)
    .await
    .context("Failed to create blogger")?;

    Ok(Blogger {
        id: result.last_insert_rowid(),
        ..blogger.clone()
    })
}

async fn get_blogger_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Blogger>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_BLOGGER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blogger by ID")?;

    Ok(row.as_ref().map(row_to_blogger_sqlite))
}

async fn get_blogger_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<Blogger>> {
    let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_BLOGGER))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get blogger by email")?;

    Ok(row.as_ref().map(row_to_blogger_sqlite))
}

async fn delete_blogger_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM bloggers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete blogger")?;

    Ok(())
}

fn row_to_blogger_sqlite(row: &sqlx::sqlite::SqliteRow) -> Blogger {
    Blogger {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_blogger_mysql(pool: &MySqlPool, blogger: &Blogger) -> Result<Blogger> {
    let result = sqlx::query(
        r#"
        INSERT INTO bloggers (email, password_hash, is_staff, is_superuser, is_active, date_joined)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&blogger.email)
    .bind(&blogger.password_hash)
    .bind(blogger.is_staff)
    .bind(blogger.is_superuser)
    .bind(blogger.is_active)
    .bind(blogger.date_joined)
    .execute(pool)
    .await
    .context("Failed to create blogger")?;

    Ok(Blogger {
        id: result.last_insert_id() as i64,
        ..blogger.clone()
    })
}

async fn get_blogger_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Blogger>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_BLOGGER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blogger by ID")?;

    Ok(row.as_ref().map(row_to_blogger_mysql))
}

async fn get_blogger_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<Blogger>> {
    let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_BLOGGER))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get blogger by email")?;

    Ok(row.as_ref().map(row_to_blogger_mysql))
}

async fn delete_blogger_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM bloggers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete blogger")?;

    Ok(())
}

fn row_to_blogger_mysql(row: &sqlx::mysql::MySqlRow) -> Blogger {
    Blogger {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, is_unique_violation, migrations};

    async fn setup_test_repo() -> SqlxBloggerRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxBloggerRepository::new(pool)
    }

    fn blogger(email: &str) -> Blogger {
        Blogger::new(email.to_string(), "argon2-hash".to_string())
    }

    #[tokio::test]
    async fn test_create_blogger() {
        let repo = setup_test_repo().await;

        let created = repo.create(&blogger("normal@user.com")).await.expect("Failed to create blogger");

        assert!(created.id > 0);
        assert_eq!(created.email, "normal@user.com");
        assert!(created.is_active);
        assert!(!created.is_staff);
        assert!(!created.is_superuser);
    }

    #[tokio::test]
    async fn test_flags_round_trip() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&blogger("super@user.com").into_superuser())
            .await
            .expect("Failed to create blogger");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get blogger")
            .expect("Blogger should exist");

        assert!(found.is_staff);
        assert!(found.is_superuser);
        assert!(found.is_active);
        assert_eq!(found.password_hash, "argon2-hash");
        assert_eq!(found.date_joined.timestamp(), created.date_joined.timestamp());
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let repo = setup_test_repo().await;
        repo.create(&blogger("find@me.com")).await.expect("Failed to create blogger");

        let found = repo.get_by_email("find@me.com").await.expect("Failed to query");
        assert!(found.is_some());

        let missing = repo.get_by_email("nobody@me.com").await.expect("Failed to query");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let repo = setup_test_repo().await;
        assert!(repo.get_by_id(999).await.expect("Failed to query").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let repo = setup_test_repo().await;
        repo.create(&blogger("dup@example.com")).await.expect("Failed to create first blogger");

        let err = repo.create(&blogger("dup@example.com")).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_delete_blogger() {
        let repo = setup_test_repo().await;
        let a = repo.create(&blogger("a@example.com")).await.expect("Failed to create blogger");
        let b = repo.create(&blogger("b@example.com")).await.expect("Failed to create blogger");

        repo.delete(a.id).await.expect("Failed to delete blogger");

        assert!(repo.get_by_id(a.id).await.expect("Failed to query").is_none());
        assert!(repo.get_by_id(b.id).await.expect("Failed to query").is_some());
    }
}
