//! Dashboard API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dashboard", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::get_metrics))
        .route("/snapshots", get(handler::list_snapshots))
        .layer(middleware::from_fn(require_page(
            "Dashboard",
            PermissionLevel::ReadOnly,
        )));

    let manage_routes = Router::new()
        .route("/snapshot", post(handler::persist_snapshot))
        .layer(middleware::from_fn(require_page(
            "Dashboard",
            PermissionLevel::FullControl,
        )));

    read_routes.merge(manage_routes)
}
