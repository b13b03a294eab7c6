//! Login and logout pages

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Uri},
    response::{Html, IntoResponse, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::models::Blogger;
use crate::services::BloggerServiceError;
use crate::web::error::{found, WebError};
use crate::web::forms::{safe_next, LoginForm, NextQuery};
use crate::web::middleware::{
    clear_session_cookie, extract_session_token, session_cookie, AppState, AuthenticatedUser,
};

/// GET /accounts/login/ - login form
pub async fn login_page(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    uri: Uri,
    Query(query): Query<NextQuery>,
) -> Result<Html<String>, WebError> {
    render_login(
        &state,
        uri.path(),
        user.as_ref().map(|u| &u.0),
        "",
        query.next.as_deref(),
        None,
    )
}

/// POST /accounts/login/ - start a session and continue to `next`
pub async fn login(
    State(state): State<AppState>,
    uri: Uri,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let email = form.email.trim();

    match state.blogger_service.login(email, &form.password).await {
        Ok(session) => {
            let cookie = session_cookie(&session.id, state.blogger_service.session_days());
            let mut response = found(safe_next(form.next.as_deref()));
            response.headers_mut().insert(
                header::SET_COOKIE,
                HeaderValue::from_str(&cookie).map_err(anyhow::Error::from)?,
            );
            Ok(response)
        }
        Err(BloggerServiceError::AuthenticationError(message)) => {
            tracing::debug!("Failed login for {}", email);
            let page = render_login(
                &state,
                uri.path(),
                None,
                email,
                form.next.as_deref(),
                Some(&message),
            )?;
            Ok(page.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /accounts/logout/ - end the session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    if let Some(token) = extract_session_token(&headers) {
        state.blogger_service.logout(&token).await?;
    }

    let mut response = found("/");
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&clear_session_cookie()).map_err(anyhow::Error::from)?,
    );
    Ok(response)
}

fn render_login(
    state: &AppState,
    path: &str,
    user: Option<&Blogger>,
    email: &str,
    next: Option<&str>,
    error: Option<&str>,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("email", email);
    context.insert("next", &next.unwrap_or(""));
    context.insert("error", &error);

    state.render("login.html", &context, path, user)
}
