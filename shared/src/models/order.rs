//! Order Model
//!
//! Minimal order record; cases reference orders for context.

use serde::{Deserialize, Serialize};

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub reference: String,
    pub description: Option<String>,
    pub total_amount: f64,
    pub created_at: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_id: i64,
    pub reference: String,
    pub description: Option<String>,
    #[serde(default)]
    pub total_amount: f64,
}

/// Update order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub reference: Option<String>,
    pub description: Option<String>,
    pub total_amount: Option<f64>,
}
