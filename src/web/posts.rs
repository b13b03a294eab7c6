//! Post pages
//!
//! - `GET /` list of published posts
//! - `GET /posts/{id}/` a single post with its comments
//! - `GET|POST /posts/` create (login required)
//! - `GET|POST /posts/{id}/edit/` update (author only)

use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    http::Uri,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::models::{Blogger, PageNumber, PagedResult, Post};
use crate::web::error::{found, WebError};
use crate::web::forms::{PostForm, PostFormView};
use crate::web::middleware::{AppState, AuthenticatedUser};

/// Query parameters for the post list
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
}

/// Pagination numbers exposed to `list.html`
#[derive(Debug, Serialize)]
struct PageView {
    number: u32,
    num_pages: u32,
    total: i64,
    has_next: bool,
    has_previous: bool,
}

impl<T> From<&PagedResult<T>> for PageView {
    fn from(result: &PagedResult<T>) -> Self {
        Self {
            number: result.page,
            num_pages: result.total_pages(),
            total: result.total,
            has_next: result.has_next(),
            has_previous: result.has_prev(),
        }
    }
}

/// GET / - published posts, paginated
pub async fn list_posts(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    uri: Uri,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    let page = PageNumber::parse(query.page.as_deref())?;
    let result = state.post_service.list_published(page).await?;

    let mut context = TeraContext::new();
    context.insert("posts", &result.items);
    context.insert("page", &PageView::from(&result));

    state.render("list.html", &context, uri.path(), current(&user))
}

/// GET /posts/{id}/ - any post, published or not
pub async fn post_detail(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_id(&id)?;
    let post = state.post_service.get_by_id(id).await?;
    let comments = state.comment_service.list_for_post(post.id).await?;
    let author = state.blogger_service.get_by_id(post.author_id).await?;
    let can_edit = user
        .as_ref()
        .is_some_and(|u| u.0.is_author_of(post.author_id));

    let mut context = TeraContext::new();
    context.insert("post", &post);
    context.insert("author_email", &author.map(|a| a.email));
    context.insert("comments", &comments);
    context.insert("can_edit", &can_edit);

    state.render("detail.html", &context, uri.path(), current(&user))
}

/// GET /posts/ - empty create form
pub async fn create_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
) -> Result<Html<String>, WebError> {
    render_form(&state, &PostFormView::default(), None, uri.path(), &user)
}

/// POST /posts/ - create an unpublished post authored by the caller
pub async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
    Form(form): Form<PostForm>,
) -> Result<Response, WebError> {
    let form = form.cleaned();

    match state.post_service.create(&user, &form.title, &form.body).await {
        Ok(_) => Ok(found("/")),
        Err(e) => match e.field_errors() {
            Some(errors) => {
                let view = PostFormView::with_errors(&form, &errors);
                Ok(render_form(&state, &view, None, uri.path(), &user)?.into_response())
            }
            None => Err(e.into()),
        },
    }
}

/// GET /posts/{id}/edit/ - form prefilled from the post
pub async fn edit_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_id(&id)?;
    let post = state.post_service.get_for_edit(id, &user).await?;
    render_form(&state, &PostFormView::from_post(&post), Some(&post), uri.path(), &user)
}

/// POST /posts/{id}/edit/ - overwrite title, body and published flag
///
/// The body is only looked at once the caller is known to be the author.
pub async fn update_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
    Path(id): Path<String>,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let post = state.post_service.get_for_edit(id, &user).await?;
    let form = match form {
        Ok(Form(form)) => form.cleaned(),
        Err(rejection) => return Ok(rejection.into_response()),
    };

    match state.post_service.update(id, &user, form.to_update_input()).await {
        Ok(_) => Ok(found("/")),
        Err(e) => match e.field_errors() {
            Some(errors) => {
                let view = PostFormView::with_errors(&form, &errors);
                Ok(render_form(&state, &view, Some(&post), uri.path(), &user)?.into_response())
            }
            None => Err(e.into()),
        },
    }
}

fn render_form(
    state: &AppState,
    form: &PostFormView,
    post: Option<&Post>,
    path: &str,
    user: &Blogger,
) -> Result<Html<String>, WebError> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("post", &post);
    context.insert("action", path);

    state.render("create_update.html", &context, path, Some(user))
}

/// Path IDs that are not plain digit strings do not name any post
fn parse_id(raw: &str) -> Result<i64, WebError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WebError::NotFound);
    }
    raw.parse::<i64>().map_err(|_| WebError::NotFound)
}

fn current(user: &Option<AuthenticatedUser>) -> Option<&Blogger> {
    user.as_ref().map(|u| &u.0)
}
