//! Proposal API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/proposals", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_page(
            "Proposals",
            PermissionLevel::ReadOnly,
        )));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/status", post(handler::change_status))
        .route("/{id}/stage", post(handler::change_stage))
        .layer(middleware::from_fn(require_page(
            "Proposals",
            PermissionLevel::FullControl,
        )));

    read_routes.merge(manage_routes)
}
