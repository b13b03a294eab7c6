//! Database repositories
//!
//! One repository per entity, each a trait plus a SQLx implementation that
//! dispatches on the configured driver.

pub mod blogger;
pub mod comment;
pub mod post;
pub mod session;

pub use blogger::{BloggerRepository, SqlxBloggerRepository};
pub use comment::{CommentRepository, CommentRepositoryImpl};
pub use post::{PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
