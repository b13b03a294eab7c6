//! Data models
//!
//! Entities persisted by the repositories (Blogger, Post, Comment, Session)
//! plus the input and pagination types passed between layers.

mod blogger;
mod comment;
mod pagination;
mod post;
mod session;

pub use blogger::{normalize_email, Blogger};
pub use comment::{Comment, CommentWithAuthor, CreateCommentInput};
pub use pagination::{num_pages, InvalidPage, ListParams, PageNumber, PagedResult};
pub use post::{
    CreatePostInput, FieldErrors, Post, UpdatePostInput, DUPLICATE_TITLE_MESSAGE, REQUIRED_MESSAGE,
    TITLE_MAX_LENGTH,
};
pub use session::Session;
