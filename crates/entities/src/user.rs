//! User entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
///
/// Users are created once at registration and never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, assigned by the store.
    pub id: i64,
    /// Unique, case-sensitive username.
    pub username: String,
    /// Opaque password hash (PHC string). Never serialized outward.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Unique identifier.
    pub id: i64,
    /// Username.
    pub username: String,
}

impl User {
    /// Returns the client-facing view of this user.
    pub fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_omits_password_hash() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            created_at: Utc::now(),
        };

        let info = user.info();
        assert_eq!(info.id, 7);
        assert_eq!(info.username, "alice");
    }
}
