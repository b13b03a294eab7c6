//! Blogger model
//!
//! A blogger is the single account type: it logs in with an email address and
//! authors posts and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered account that can author posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blogger {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, used to log in)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// May access staff-only tooling
    pub is_staff: bool,
    /// Holds every permission implicitly
    pub is_superuser: bool,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    /// When the account was created
    pub date_joined: DateTime<Utc>,
}

impl Blogger {
    /// Create a regular, active blogger.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            email,
            password_hash,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    /// Grant staff and superuser flags
    pub fn into_superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }

    /// Whether this blogger wrote the content owned by `author_id`
    pub fn is_author_of(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}

/// Normalise an email address by lower-casing its domain part.
///
/// The local part is left untouched; mailbox names may be case sensitive.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blogger_new() {
        let blogger = Blogger::new("normal@user.com".to_string(), "hash".to_string());

        assert_eq!(blogger.id, 0);
        assert_eq!(blogger.email, "normal@user.com");
        assert!(blogger.is_active);
        assert!(!blogger.is_staff);
        assert!(!blogger.is_superuser);
    }

    #[test]
    fn test_into_superuser() {
        let admin = Blogger::new("super@user.com".to_string(), "hash".to_string()).into_superuser();

        assert!(admin.is_active);
        assert!(admin.is_staff);
        assert!(admin.is_superuser);
    }

    #[test]
    fn test_is_author_of() {
        let mut blogger = Blogger::new("a@b.com".to_string(), "hash".to_string());
        blogger.id = 7;

        assert!(blogger.is_author_of(7));
        assert!(!blogger.is_author_of(8));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let blogger = Blogger::new("a@b.com".to_string(), "secret-hash".to_string());
        let json = serde_json::to_string(&blogger).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("Someone@EXAMPLE.Com"), "Someone@example.com");
        assert_eq!(normalize_email("  a@B.org "), "a@b.org");
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
        // Only the last @ separates the domain
        assert_eq!(normalize_email("\"x@y\"@HOST"), "\"x@y\"@host");
    }
}
