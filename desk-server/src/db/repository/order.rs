//! Order Repository

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderCreate, OrderUpdate};
use sqlx::SqlitePool;

const ORDER_SELECT: &str =
    "SELECT id, customer_id, reference, description, total_amount, created_at FROM orders";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Order>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_customer(pool: &SqlitePool, customer_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE customer_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(customer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: &OrderCreate) -> RepoResult<Order> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO orders (id, customer_id, reference, description, total_amount, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.customer_id)
    .bind(&data.reference)
    .bind(&data.description)
    .bind(data.total_amount)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &OrderUpdate) -> RepoResult<Order> {
    let rows = sqlx::query(
        "UPDATE orders SET reference = COALESCE(?1, reference), description = COALESCE(?2, description), total_amount = COALESCE(?3, total_amount) WHERE id = ?4",
    )
    .bind(&data.reference)
    .bind(&data.description)
    .bind(data.total_amount)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
