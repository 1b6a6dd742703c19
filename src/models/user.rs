use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// A user's role within the system.
///
/// Admins have full access, managers oversee all tasks, employees only see
/// tasks assigned to themselves (see `query::search_tasks`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    /// Whether this role may see and filter tasks across the whole team.
    pub fn sees_all_tasks(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

/// Represents a user entity as stored in the database and returned by the API.
///
/// The password hash is never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, full_name, role, password_hash, created_at, updated_at";

impl User {
    /// Looks a user up by username OR email, first match. Used both for login
    /// resolution and for resolving the token subject on each request.
    pub async fn find_by_identifier(
        pool: &SqlitePool,
        ident: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?1 OR email = ?1",
            USER_COLUMNS
        ))
        .bind(ident)
        .fetch_optional(pool)
        .await
    }

    /// Resolves a flexible external reference: the primary id first, then
    /// username or email equality, short-circuiting on the first hit.
    pub async fn resolve_by_reference(
        pool: &SqlitePool,
        reference: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        if let Ok(id) = reference.parse::<i64>() {
            let by_id = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = ?",
                USER_COLUMNS
            ))
            .bind(id)
            .fetch_optional(pool)
            .await?;
            if by_id.is_some() {
                return Ok(by_id);
            }
        }
        Self::find_by_identifier(pool, reference).await
    }
}

/// Payload for creating a new user account.
#[derive(Debug, Deserialize, Validate)]
pub struct UserCreate {
    /// Must be between 3 and 32 characters, alphanumeric, underscores or hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub full_name: Option<String>,
    /// Requested role; defaults to employee. Ignored for the very first
    /// account, which is always created as admin (bootstrap rule).
    pub role: Option<Role>,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Partial update payload for admin-driven user edits. Only supplied fields
/// change; `full_name` distinguishes "absent" from "set to null".
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub full_name: Option<Option<String>>,
    pub role: Option<Role>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
}

/// Self-service profile update for `PATCH /users/me`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct MeUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub full_name: Option<Option<String>>,
}

/// Payload for `PATCH /users/me/password`.
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordChange {
    pub current_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_create_validation() {
        let input = UserCreate {
            username: "test_user-123".to_string(),
            email: "test@example.com".to_string(),
            full_name: None,
            role: None,
            password: "password123".to_string(),
        };
        assert!(input.validate().is_ok());

        let invalid_email = UserCreate {
            username: "testuser".to_string(),
            email: "invalid-email".to_string(),
            full_name: None,
            role: None,
            password: "password123".to_string(),
        };
        assert!(invalid_email.validate().is_err());

        let invalid_username = UserCreate {
            username: "test user!".to_string(),
            email: "test@example.com".to_string(),
            full_name: None,
            role: None,
            password: "password123".to_string(),
        };
        assert!(invalid_username.validate().is_err());

        let short_password = UserCreate {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            full_name: None,
            role: None,
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_user_update_absent_vs_null_full_name() {
        let absent: UserUpdate = serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        assert!(absent.full_name.is_none());

        let cleared: UserUpdate = serde_json::from_str(r#"{"full_name": null}"#).unwrap();
        assert_eq!(cleared.full_name, Some(None));

        let set: UserUpdate = serde_json::from_str(r#"{"full_name": "Alice"}"#).unwrap();
        assert_eq!(set.full_name, Some(Some("Alice".to_string())));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"manager\"").unwrap();
        assert_eq!(role, Role::Manager);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_role_visibility() {
        assert!(Role::Admin.sees_all_tasks());
        assert!(Role::Manager.sees_all_tasks());
        assert!(!Role::Employee.sees_all_tasks());
    }
}
