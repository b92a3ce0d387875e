//! Entity File API 模块 (附件上传/下载)

mod handler;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/files", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/entity/{entity_type}/{entity_id}", get(handler::list_for_entity))
        .route("/{id}/download", get(handler::download))
        .route("/{id}/thumbnail", get(handler::thumbnail))
        .layer(middleware::from_fn(require_page(
            "Files",
            PermissionLevel::ReadOnly,
        )));

    let manage_routes = Router::new()
        .route(
            "/entity/{entity_type}/{entity_id}",
            post(handler::upload).layer(DefaultBodyLimit::max(handler::MAX_FILE_SIZE + 1024 * 1024)),
        )
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_page(
            "Files",
            PermissionLevel::FullControl,
        )));

    read_routes.merge(manage_routes)
}
