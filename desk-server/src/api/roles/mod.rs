//! Role API 模块 (角色 / 页面授权 / 客户覆盖范围)

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/roles", routes())
}

fn routes() -> Router<ServerState> {
    // 读取路由：Admin 页面 ReadOnly 即可
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/pages", get(handler::get_all_pages))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/permissions", get(handler::get_permissions))
        .route("/{id}/coverage", get(handler::get_coverage))
        .route("/{id}/users", get(handler::get_users))
        .layer(middleware::from_fn(require_page(
            "Admin",
            PermissionLevel::ReadOnly,
        )));

    // 管理路由：需要 Admin 页面 FullControl
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/permissions", put(handler::update_permissions))
        .route("/{id}/coverage", put(handler::replace_coverage))
        .layer(middleware::from_fn(require_page(
            "Admin",
            PermissionLevel::FullControl,
        )));

    read_routes.merge(manage_routes)
}
