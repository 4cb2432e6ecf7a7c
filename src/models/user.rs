use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row in the user directory. Accounts are managed by the identity
/// provider; this service only reads them (batch path).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Nickname when set and non-blank, email otherwise.
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => &self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(nickname: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            nickname: nickname.map(|s| s.to_string()),
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        assert_eq!(user(Some("dawn")).display_name(), "dawn");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(None).display_name(), "user@example.com");
        assert_eq!(user(Some("")).display_name(), "user@example.com");
        assert_eq!(user(Some("   ")).display_name(), "user@example.com");
    }
}
