//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口（登录、当前用户、权限刷新）
//! - [`users`] - 用户管理接口
//! - [`roles`] - 角色 / 权限 / 覆盖范围管理接口
//! - [`customers`] - 客户管理接口
//! - [`cases`] - 支持工单接口
//! - [`proposals`] - 售前提案接口
//! - [`projects`] - 项目接口
//! - [`orders`] - 订单接口
//! - [`sla_config`] - SLA 配置接口
//! - [`audit_log`] - 审计日志查询接口
//! - [`files`] - 附件上传/下载接口
//! - [`dashboard`] - 指标看板接口

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod audit_log;
pub mod auth;
pub mod cases;
pub mod customers;
pub mod dashboard;
pub mod files;
pub mod health;
pub mod orders;
pub mod projects;
pub mod proposals;
pub mod roles;
pub mod sla_config;
pub mod users;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(roles::router())
        .merge(customers::router())
        .merge(cases::router())
        .merge(proposals::router())
        .merge(projects::router())
        .merge(orders::router())
        .merge(sla_config::router())
        .merge(audit_log::router())
        .merge(files::router())
        .merge(dashboard::router())
}

/// Build a fully configured application with all middleware and state
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Get user context (JWT authentication) - executes before routes, injects CurrentUser
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
}
