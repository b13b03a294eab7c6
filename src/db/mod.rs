//! Database layer
//!
//! Supports SQLite (default, single-file deployment) and MySQL behind the
//! `DatabasePool` trait. The driver is selected by configuration.
//!
//! # Usage
//!
//! ```ignore
//! use blogroll::config::DatabaseConfig;
//! use blogroll::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Whether `err` was caused by a UNIQUE constraint rejecting a write.
///
/// Repositories wrap driver errors with context, so the whole chain is
/// searched for the underlying `sqlx::Error`.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}
