/// User model
///
/// Users are owned by the identity store. Teams and tasks reference them by id
/// only. Passwords are stored as Argon2id hashes, never in plaintext.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     username VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     display_name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     roles TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_username_key UNIQUE (username),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to every registered user
pub const ROLE_USER: &str = "ROLE_USER";

/// User account snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID, immutable once assigned
    pub id: Uuid,

    /// Unique login name; also the session token subject
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Name shown in the UI
    pub display_name: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Global role names (e.g. "ROLE_USER")
    pub roles: Vec<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,

    /// Falls back to the username when absent or blank
    pub display_name: Option<String>,

    /// Already-hashed password (NOT plaintext!)
    pub password_hash: String,
}

impl User {
    /// Builds a fresh user with a new id and the default `ROLE_USER` role
    pub fn new(data: NewUser) -> Self {
        let now = Utc::now();
        let display_name = data
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| data.username.clone());

        Self {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            display_name,
            password_hash: data.password_hash,
            roles: vec![ROLE_USER.to_string()],
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(display_name: Option<&str>) -> User {
        User::new(NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: display_name.map(str::to_string),
            password_hash: "hash".to_string(),
        })
    }

    #[test]
    fn test_new_user_defaults() {
        let user = new_user(Some("Alice A."));

        assert_eq!(user.display_name, "Alice A.");
        assert_eq!(user.roles, vec![ROLE_USER.to_string()]);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(new_user(None).display_name, "alice");
        assert_eq!(new_user(Some("   ")).display_name, "alice");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(new_user(None)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }
}
