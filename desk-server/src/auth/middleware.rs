//! 认证与授权中间件
//!
//! - [`require_auth`]: 验证 JWT，经由权限缓存解析授权，注入 [`CurrentUser`]
//! - [`require_page`]: 路由级页面权限检查
//!
//! 权限解析失败一律 fail closed（拒绝访问），绝不 fail open。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::engine::{self, CurrentUser};
use crate::auth::permissions::allowed_levels;
use crate::auth::{JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;
use shared::models::PermissionLevel;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT，再通过权限缓存 /
/// 决策引擎解析该用户名的授权集合，注入 [`CurrentUser`]。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/auth/login`、`/api/health`
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // 公共 API 路由跳过认证
    let is_public_api_route = path == "/api/auth/login" || path == "/api/health";
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.jwt_service.clone();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    // 验证令牌
    let claims = match jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            return match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            };
        }
    };

    // 解析授权（缓存 → 引擎），任何失败都拒绝
    let user = resolve_current_user(&state, &claims.username).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Resolve a username into a [`CurrentUser`] through the permission cache.
///
/// Cache miss falls through to the decision engine's `resolve_grants`; a
/// storage failure there DENIES the request (fail closed) rather than
/// letting it proceed unauthorized.
pub async fn resolve_current_user(
    state: &ServerState,
    username: &str,
) -> Result<CurrentUser, AppError> {
    let grants = match state.permission_cache.get(username) {
        Some(cached) => cached,
        None => match engine::resolve_grants(&state.pool, username).await {
            Ok(resolved) => {
                state.permission_cache.insert(username, resolved.clone());
                resolved
            }
            Err(e) => {
                security_log!(
                    "ERROR",
                    "permission_lookup_failed",
                    username = username.to_string(),
                    error = format!("{}", e)
                );
                return Err(AppError::forbidden("Permission lookup failed"));
            }
        },
    };

    let grants = grants.ok_or(AppError::Unauthorized)?;
    if !grants.is_active {
        return Err(AppError::forbidden("Account has been disabled"));
    }

    Ok(CurrentUser {
        id: grants.user_id,
        username: grants.username.clone(),
        display_name: grants.display_name.clone(),
        grants,
    })
}

/// 页面权限中间件
///
/// # 参数
///
/// - `page`: 页面名，如 `"Cases"`, `"Admin"`
/// - `minimum`: 所需最低级别；ReadOnly 要求可由 FullControl 满足
///
/// # 用法
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/cases", get(handler::list))
///     .layer(middleware::from_fn(require_page("Cases", PermissionLevel::ReadOnly)));
/// ```
///
/// # 错误
///
/// 无权限返回 403 Forbidden
pub fn require_page(
    page: &'static str,
    minimum: PermissionLevel,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::Unauthorized)?;

            if !user.can_access(page, allowed_levels(minimum)) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    username = user.username.clone(),
                    required_page = page,
                    required_level = minimum.as_str()
                );
                return Err(AppError::forbidden(format!(
                    "Permission denied: {} ({})",
                    page,
                    minimum.as_str()
                )));
            }

            Ok(next.run(req).await)
        })
    }
}
