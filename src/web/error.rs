//! Web error type
//!
//! Handlers return `WebError` for anything that is not a normal page.
//! Authorization failures become redirects to the login page; the 404 and
//! 500 responses are tagged with an [`ErrorPage`] extension which
//! [`crate::web::middleware::render_error_pages`] turns into HTML.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::models::InvalidPage;
use crate::services::{BloggerServiceError, CommentServiceError, PostServiceError};

/// Login page that authorization failures redirect to
pub const LOGIN_URL: &str = "/accounts/login/";

/// Errors surfaced by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Not found")]
    NotFound,

    /// Redirect to the login page, optionally returning to `next` afterwards
    #[error("Login required")]
    LoginRequired { next: Option<String> },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Marker left on error responses for the error page renderer
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound => error_page(StatusCode::NOT_FOUND, "Page not found"),
            WebError::LoginRequired { next } => found(&login_url(next.as_deref())),
            WebError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        }
    }
}

impl From<InvalidPage> for WebError {
    fn from(_: InvalidPage) -> Self {
        WebError::NotFound
    }
}

impl From<PostServiceError> for WebError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::NotFound(_) | PostServiceError::InvalidPage(_) => WebError::NotFound,
            PostServiceError::NotAuthor { .. } => WebError::LoginRequired { next: None },
            PostServiceError::InternalError(e) => WebError::Internal(e),
            other => WebError::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<BloggerServiceError> for WebError {
    fn from(e: BloggerServiceError) -> Self {
        match e {
            BloggerServiceError::InternalError(e) => WebError::Internal(e),
            other => WebError::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<CommentServiceError> for WebError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::PostNotFound(_) => WebError::NotFound,
            CommentServiceError::InternalError(e) => WebError::Internal(e),
            other => WebError::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

/// `302 Found` to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Login URL, carrying `next` when given
pub fn login_url(next: Option<&str>) -> String {
    match next {
        Some(next) => format!("{}?next={}", LOGIN_URL, urlencoding::encode(next)),
        None => LOGIN_URL.to_string(),
    }
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let mut response = (status, message.to_string()).into_response();
    response.extensions_mut().insert(ErrorPage {
        status,
        message: message.to_string(),
    });
    response
}
