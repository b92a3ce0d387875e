//! Auth API 模块 (登录为公共路由，其余需认证)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/me", get(handler::me))
        .route(
            "/api/auth/refresh-permissions",
            post(handler::refresh_permissions),
        )
}
