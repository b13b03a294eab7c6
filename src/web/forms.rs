//! HTML form payloads
//!
//! Forms arrive as `application/x-www-form-urlencoded`. Every field defaults
//! to empty so a partial submission is reported as field errors rather than
//! rejected by the extractor. Unknown fields (such as an `author` value) are
//! ignored.

use serde::{Deserialize, Serialize};

use crate::models::{FieldErrors, Post, UpdatePostInput};

/// Post create/update form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Checkbox value; absent when unchecked
    #[serde(default)]
    pub published: Option<String>,
}

impl PostForm {
    /// Trim surrounding whitespace from the text fields
    pub fn cleaned(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            published: self.published,
        }
    }

    pub fn is_published(&self) -> bool {
        parse_checkbox(self.published.as_deref())
    }

    pub fn to_update_input(&self) -> UpdatePostInput {
        UpdatePostInput::new(self.title.clone(), self.body.clone(), self.is_published())
    }
}

/// Interpret an HTML checkbox value.
///
/// Unchecked boxes are not submitted at all; the explicit falsy spellings
/// are accepted as well.
pub fn parse_checkbox(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => false,
        Some(v) => !matches!(v.as_str(), "" | "false" | "0" | "off"),
    }
}

/// Form state handed to `create_update.html`
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostFormView {
    pub title: String,
    pub body: String,
    pub published: bool,
    pub title_errors: Vec<String>,
    pub body_errors: Vec<String>,
}

impl PostFormView {
    /// Prefilled from a stored post
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
            published: post.published,
            ..Self::default()
        }
    }

    /// Echo a rejected submission together with its errors
    pub fn with_errors(form: &PostForm, errors: &FieldErrors) -> Self {
        Self {
            title: form.title.clone(),
            body: form.body.clone(),
            published: form.is_published(),
            title_errors: errors.get("title").to_vec(),
            body_errors: errors.get("body").to_vec(),
        }
    }
}

/// Login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Query string carrying a post-login destination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Post-login destination: `next` when it is a local path, `/` otherwise
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path
        }
        _ => "/",
    }
}
