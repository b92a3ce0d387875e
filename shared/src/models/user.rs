//! User Model

use serde::{Deserialize, Serialize};

/// User entity (DB row, includes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// BCP 47 tag, e.g. "en", "pt-PT"
    pub preferred_language: String,
    pub is_system: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// User response (without password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub preferred_language: String,
    pub is_system: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            preferred_language: u.preferred_language,
            is_system: u.is_system,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub display_name: String,
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Update user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub password: Option<String>,
    pub preferred_language: Option<String>,
    pub is_active: Option<bool>,
}

/// A role assignment as seen from the user side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserRoleAssignment {
    pub role_id: i64,
    pub role_name: String,
    pub assigned_at: i64,
}

/// Replace-assignments payload (`PUT /api/users/{id}/roles`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRolesRequest {
    pub role_ids: Vec<i64>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}
