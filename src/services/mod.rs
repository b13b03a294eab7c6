//! Services layer - Business logic
//!
//! Services sit between the web handlers and the repositories. They are
//! responsible for:
//! - Implementing business rules (authorship, publication, validation)
//! - Translating database failures into domain errors
//! - Logging the state changes they make

pub mod blogger;
pub mod comment;
pub mod password;
pub mod post;

pub use blogger::{BloggerService, BloggerServiceError, DEFAULT_SESSION_DAYS, INVALID_LOGIN};
pub use comment::{CommentService, CommentServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError, DEFAULT_PAGE_SIZE};
