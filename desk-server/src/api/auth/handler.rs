//! Authentication Handlers
//!
//! Handles login, the current-user endpoint, and manual permission refresh.

use std::time::Duration;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::audit::AuditAction;
use crate::auth::password;
use crate::auth::{CurrentUser, PermissionSet};
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::utils::AppError;
use shared::models::{LoginRequest, LoginResponse, UserResponse};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/login
///
/// Authenticates user credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = req.username.clone();

    let user = user_repo::find_by_username(&state.pool, &username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let user = match user {
        Some(u) => {
            if !u.is_active {
                return Err(AppError::forbidden("Account has been disabled"));
            }

            let password_valid = password::verify_password(&req.password, &u.password_hash)?;
            if !password_valid {
                state.audit.log(
                    AuditAction::LoginFailed,
                    "auth",
                    format!("user:{}", username),
                    None,
                    None,
                    serde_json::json!({"reason": "invalid_credentials"}),
                );
                tracing::warn!(username = %username, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            state.audit.log(
                AuditAction::LoginFailed,
                "auth",
                format!("user:{}", username),
                None,
                None,
                serde_json::json!({"reason": "user_not_found"}),
            );
            tracing::warn!(username = %username, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let token = state
        .jwt_service
        .generate_token(user.id, &user.username, &user.display_name)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    state.audit.log(
        AuditAction::LoginSuccess,
        "auth",
        format!("user:{}", user.id),
        Some(user.id),
        Some(user.display_name.clone()),
        serde_json::json!({"username": &user.username}),
    );

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Current-user response, including the legacy permission strings for
/// client-side permission caches
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    /// One legacy-format string per assigned role
    pub permission_strings: Vec<String>,
}

/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    let permission_strings = user
        .grants
        .role_grants
        .iter()
        .map(PermissionSet::to_permission_string)
        .collect();

    Json(MeResponse {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        permission_strings,
    })
}

/// POST /api/auth/refresh-permissions
///
/// Manual cache invalidation for the calling user, the only invalidation
/// besides TTL expiry. The next request re-resolves grants from the store.
pub async fn refresh_permissions(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> Json<serde_json::Value> {
    state.permission_cache.invalidate(&user.username);

    state.audit.log(
        AuditAction::PermissionsRefreshed,
        "auth",
        format!("user:{}", user.id),
        Some(user.id),
        Some(user.display_name.clone()),
        serde_json::json!({}),
    );

    Json(serde_json::json!({ "refreshed": true }))
}
