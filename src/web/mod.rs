//! Web layer - HTTP handlers and routing
//!
//! Server-rendered HTML pages:
//! - Post list, detail, create and update pages
//! - Login and logout
//!
//! The logged-in blogger is loaded from the session cookie by middleware
//! and travels with the request as an [`AuthenticatedUser`] extension.

pub mod accounts;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod posts;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::{WebError, LOGIN_URL};
pub use middleware::{AppState, AuthenticatedUser};

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    // Create and update need a logged-in blogger
    let protected_routes = Router::new()
        .route("/posts/", get(posts::create_form).post(posts::create_post))
        .route(
            "/posts/{id}/edit/",
            get(posts::edit_form).post(posts::update_post),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_login));

    Router::new()
        .route("/", get(posts::list_posts))
        .route("/posts/{id}/", get(posts::post_detail))
        .route(
            "/accounts/login/",
            get(accounts::login_page).post(accounts::login),
        )
        .route("/accounts/logout/", post(accounts::logout))
        .merge(protected_routes)
        .fallback(not_found)
        // Outermost first: the blogger is loaded before error pages render
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::load_current_user,
                ))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::render_error_pages,
                )),
        )
        .with_state(state)
}

async fn not_found() -> WebError {
    WebError::NotFound
}

#[cfg(test)]
mod tests;
