//! Project API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/projects", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_page(
            "Projects",
            PermissionLevel::ReadOnly,
        )));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_page(
            "Projects",
            PermissionLevel::FullControl,
        )));

    read_routes.merge(manage_routes)
}
