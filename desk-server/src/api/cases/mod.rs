//! Support Case API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_page;
use crate::core::ServerState;
use shared::models::PermissionLevel;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cases", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/sla", get(handler::get_sla))
        .layer(middleware::from_fn(require_page(
            "Cases",
            PermissionLevel::ReadOnly,
        )));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update))
        .route("/{id}/status", post(handler::change_status))
        .route("/{id}/assign", post(handler::assign))
        .layer(middleware::from_fn(require_page(
            "Cases",
            PermissionLevel::FullControl,
        )));

    read_routes.merge(manage_routes)
}
