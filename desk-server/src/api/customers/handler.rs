//! Customer API Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;

use crate::audit::{AuditAction, create_diff, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::customer as customer_repo;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// GET /api/customers
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Customer>>> {
    let customers = customer_repo::find_all(&state.pool).await?;
    Ok(Json(customers))
}

/// GET /api/customers/search?q=
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = customer_repo::search(&state.pool, &query.q).await?;
    Ok(Json(customers))
}

/// GET /api/customers/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Customer>> {
    let customer = customer_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))?;
    Ok(Json(customer))
}

/// POST /api/customers
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<Json<Customer>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        customer_name = %payload.name,
        "Creating customer"
    );

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;

    let customer = customer_repo::create(&state.pool, &payload).await?;

    let id = customer.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::CustomerCreated,
        "customer",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&customer, "customer")
    );

    Ok(Json(customer))
}

/// PUT /api/customers/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;

    let old_customer = customer_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))?;

    let customer = customer_repo::update(&state.pool, id, &payload).await?;

    let id_str = id.to_string();
    audit_log!(
        state.audit,
        AuditAction::CustomerUpdated,
        "customer",
        &id_str,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_diff(&old_customer, &customer, "customer")
    );

    Ok(Json(customer))
}

/// DELETE /api/customers/{id}: soft delete
pub async fn deactivate(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let result = customer_repo::deactivate(&state.pool, id).await?;

    if result {
        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::CustomerDeactivated,
            "customer",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = serde_json::json!({})
        );
    }

    Ok(Json(result))
}
