//! Blogger service
//!
//! Account creation, login/logout and session validation. There is no
//! self-service registration; accounts come from `create_user` /
//! `create_superuser` (the latter also used to bootstrap an admin at startup).

use crate::db::is_unique_violation;
use crate::db::repositories::{BloggerRepository, SessionRepository};
use crate::models::{normalize_email, Blogger, Session};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Default session lifetime in days
pub const DEFAULT_SESSION_DAYS: i64 = 14;

/// Message shown for any failed login, whatever the cause
pub const INVALID_LOGIN: &str =
    "Please enter a correct email and password. Note that both fields may be case-sensitive.";

/// Error types for blogger service operations
#[derive(Debug, thiserror::Error)]
pub enum BloggerServiceError {
    /// Authentication failed (invalid credentials or inactive account)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Another blogger already uses this email
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Blogger service for managing accounts and authentication
pub struct BloggerService {
    blogger_repo: Arc<dyn BloggerRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_days: i64,
}

impl BloggerService {
    pub fn new(
        blogger_repo: Arc<dyn BloggerRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(blogger_repo, session_repo, DEFAULT_SESSION_DAYS)
    }

    /// Create a service whose sessions last `session_days`
    pub fn with_session_expiration(
        blogger_repo: Arc<dyn BloggerRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_days: i64,
    ) -> Self {
        Self {
            blogger_repo,
            session_repo,
            session_days,
        }
    }

    /// Session lifetime in days
    pub fn session_days(&self) -> i64 {
        self.session_days
    }

    /// Create a regular active blogger (not staff, not superuser)
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Blogger, BloggerServiceError> {
        let blogger = self.new_blogger(email, password)?;
        self.insert(blogger).await
    }

    /// Create an active blogger with the staff and superuser flags set
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Blogger, BloggerServiceError> {
        let blogger = self.new_blogger(email, password)?.into_superuser();
        self.insert(blogger).await
    }

    /// Create the configured superuser unless an account with that email exists.
    ///
    /// Returns the newly created blogger, or `None` when nothing was done.
    pub async fn ensure_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Blogger>, BloggerServiceError> {
        if self.get_by_email(email).await?.is_some() {
            tracing::debug!("Superuser {} already exists", normalize_email(email));
            return Ok(None);
        }

        match self.create_superuser(email, password).await {
            Ok(blogger) => Ok(Some(blogger)),
            // Another instance created it in the meantime
            Err(BloggerServiceError::EmailTaken(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Log in with email and password, returning a fresh session.
    ///
    /// Unknown email, wrong password and inactive accounts all fail with
    /// the same `AuthenticationError`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, BloggerServiceError> {
        let invalid = || BloggerServiceError::AuthenticationError(INVALID_LOGIN.to_string());

        let blogger = self.get_by_email(email).await?.ok_or_else(invalid)?;

        let password_valid = verify_password(password, &blogger.password_hash)
            .context("Failed to verify password")?;
        if !password_valid || !blogger.is_active {
            tracing::debug!("Rejected login for blogger {}", blogger.id);
            return Err(invalid());
        }

        let session = Session::new(blogger.id, self.session_days);
        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::info!("Blogger {} logged in", blogger.id);
        Ok(session)
    }

    /// Invalidate a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), BloggerServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its blogger.
    ///
    /// Expired sessions are deleted and yield `None`, as do sessions of
    /// inactive bloggers.
    pub async fn validate_session(&self, token: &str) -> Result<Option<Blogger>, BloggerServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let blogger = self
            .blogger_repo
            .get_by_id(session.blogger_id)
            .await
            .context("Failed to get blogger")?;

        Ok(blogger.filter(|b| b.is_active))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Blogger>, BloggerServiceError> {
        let blogger = self
            .blogger_repo
            .get_by_id(id)
            .await
            .context("Failed to get blogger by ID")?;
        Ok(blogger)
    }

    /// Look up a blogger; the email is normalised first
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Blogger>, BloggerServiceError> {
        let blogger = self
            .blogger_repo
            .get_by_email(&normalize_email(email))
            .await
            .context("Failed to get blogger by email")?;
        Ok(blogger)
    }

    /// Delete a blogger. Their posts, comments and sessions go with them.
    pub async fn delete(&self, id: i64) -> Result<(), BloggerServiceError> {
        self.blogger_repo
            .delete(id)
            .await
            .context("Failed to delete blogger")?;
        tracing::info!("Deleted blogger {}", id);
        Ok(())
    }

    /// Remove expired sessions, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, BloggerServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    fn new_blogger(&self, email: &str, password: &str) -> Result<Blogger, BloggerServiceError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(BloggerServiceError::ValidationError(
                "The given email must be set".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(BloggerServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(BloggerServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        Ok(Blogger::new(email, password_hash))
    }

    async fn insert(&self, blogger: Blogger) -> Result<Blogger, BloggerServiceError> {
        match self.blogger_repo.create(&blogger).await {
            Ok(created) => {
                tracing::info!(
                    "Created blogger {} (superuser: {})",
                    created.id,
                    created.is_superuser
                );
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => Err(BloggerServiceError::EmailTaken(blogger.email)),
            Err(e) => Err(BloggerServiceError::InternalError(e)),
        }
    }
}
