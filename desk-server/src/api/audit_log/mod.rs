//! Audit Log API 模块 (审计日志查询，只读)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit-log", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route_layer(middleware::from_fn(require_page(
            "Audit",
            PermissionLevel::ReadOnly,
        )))
}
