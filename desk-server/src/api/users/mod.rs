//! User API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    // 读取路由：Users 页面 ReadOnly 即可
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/roles", get(handler::get_roles))
        .layer(middleware::from_fn(require_page(
            "Users",
            PermissionLevel::ReadOnly,
        )));

    // 管理路由：需要 Users 页面 FullControl
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::deactivate))
        .route("/{id}/roles", put(handler::replace_roles))
        .layer(middleware::from_fn(require_page(
            "Users",
            PermissionLevel::FullControl,
        )));

    read_routes.merge(manage_routes)
}
