//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of characters in a post title
pub const TITLE_MAX_LENGTH: usize = 255;

/// Message attached to a missing required field
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Message attached to `title` when another post already uses it
pub const DUPLICATE_TITLE_MESSAGE: &str = "Post with this title already exists.";

/// A blog post written by a single blogger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Title, unique across all posts
    pub title: String,
    /// Post body
    pub body: String,
    /// Author blogger ID
    pub author_id: i64,
    /// Set once when the post is created
    pub pub_date: DateTime<Utc>,
    /// Whether the post shows up in the public list
    pub published: bool,
}

/// Input for creating a new post.
///
/// New posts always start unpublished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub body: String,
    pub author_id: i64,
}

impl CreatePostInput {
    pub fn new(title: impl Into<String>, body: impl Into<String>, author_id: i64) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            author_id,
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        validate_title_and_body(&self.title, &self.body).into_result()
    }
}

/// Input for updating a post. Every editable field is overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub title: String,
    pub body: String,
    pub published: bool,
}

impl UpdatePostInput {
    pub fn new(title: impl Into<String>, body: impl Into<String>, published: bool) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            published,
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        validate_title_and_body(&self.title, &self.body).into_result()
    }
}

fn validate_title_and_body(title: &str, body: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if title.trim().is_empty() {
        errors.add("title", REQUIRED_MESSAGE);
    } else {
        let length = title.chars().count();
        if length > TITLE_MAX_LENGTH {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    TITLE_MAX_LENGTH, length
                ),
            );
        }
    }

    if body.trim().is_empty() {
        errors.add("body", REQUIRED_MESSAGE);
    }

    errors
}

/// Validation messages keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// A single error on one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// Messages for `field`, empty when it has none
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when there are no errors
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
