//! Web middleware
//!
//! Contains middleware for:
//! - Loading the logged-in blogger from the session cookie
//! - Requiring a login on protected routes
//! - Rendering error pages

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::config::Config;
use crate::db::repositories::{
    CommentRepositoryImpl, SqlxBloggerRepository, SqlxPostRepository, SqlxSessionRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Blogger;
use crate::services::{BloggerService, CommentService, PostService};
use crate::theme::{StandardTemplateVars, ThemeEngine};
use crate::web::error::{ErrorPage, WebError};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub blogger_service: Arc<BloggerService>,
    pub post_service: Arc<PostService>,
    pub comment_service: Arc<CommentService>,
    pub theme_engine: Arc<ThemeEngine>,
    pub site_name: Arc<str>,
}

impl AppState {
    /// Wire repositories and services over `pool`
    pub fn new(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let post_repo = SqlxPostRepository::boxed(pool.clone());

        let blogger_service = BloggerService::with_session_expiration(
            SqlxBloggerRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.auth.session_days,
        );
        let post_service = PostService::with_page_size(post_repo.clone(), config.blog.page_size);
        let comment_service = CommentService::new(CommentRepositoryImpl::boxed(pool), post_repo);

        Ok(Self {
            blogger_service: Arc::new(blogger_service),
            post_service: Arc::new(post_service),
            comment_service: Arc::new(comment_service),
            theme_engine: Arc::new(ThemeEngine::new()?),
            site_name: Arc::from(config.blog.title.as_str()),
        })
    }

    /// Render a page with the standard template variables
    pub fn render(
        &self,
        template: &str,
        context: &TeraContext,
        request_path: &str,
        current_user: Option<&Blogger>,
    ) -> Result<Html<String>, WebError> {
        let vars = StandardTemplateVars::new(self.site_name.as_ref(), request_path, current_user);
        let html = self
            .theme_engine
            .render_with_standard_vars(template, context, &vars)?;
        Ok(Html(html))
    }
}

/// Logged-in blogger extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Blogger);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| WebError::LoginRequired {
                next: Some(path_and_query(parts.uri.path_and_query())),
            })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

/// Extract the session token from the `Cookie` header
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// `Set-Cookie` value for a new session
pub fn session_cookie(token: &str, days: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        days.saturating_mul(24 * 60 * 60)
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Attach the logged-in blogger, if any, to the request.
///
/// Invalid or expired sessions leave the request anonymous.
pub async fn load_current_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        match state.blogger_service.validate_session(&token).await {
            Ok(Some(blogger)) => {
                request.extensions_mut().insert(AuthenticatedUser(blogger));
            }
            Ok(None) => tracing::debug!("Ignoring unknown or expired session"),
            Err(e) => tracing::error!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// Redirect anonymous requests to the login page, returning here afterwards
pub async fn require_login(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_some() {
        return next.run(request).await;
    }

    let here = path_and_query(request.uri().path_and_query());
    tracing::debug!("Anonymous request to {} redirected to login", here);
    WebError::LoginRequired { next: Some(here) }.into_response()
}

/// Replace tagged error responses with the rendered `error.html`
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.0.clone());

    let response = next.run(request).await;

    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let mut context = TeraContext::new();
    context.insert("status", &page.status.as_u16());
    context.insert("message", &page.message);

    match state.render("error.html", &context, &path, user.as_ref()) {
        Ok(html) => (page.status, html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {}", e);
            response
        }
    }
}

fn path_and_query(value: Option<&axum::http::uri::PathAndQuery>) -> String {
    value.map(|pq| pq.as_str().to_string()).unwrap_or_else(|| "/".to_string())
}
