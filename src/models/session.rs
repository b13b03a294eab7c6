//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Login session, identified by the token stored in the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Logged-in blogger
    pub blogger_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a new session for `blogger_id` lasting `days`.
    ///
    /// A lifetime past the representable range ends at `DateTime::MAX_UTC`.
    pub fn new(blogger_id: i64, days: i64) -> Self {
        let now = Utc::now();
        let expires_at = Duration::try_days(days)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            blogger_id,
            expires_at,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
