//! Pre-Sales Proposal Model
//!
//! `status` (approval workflow) and `stage` (sales funnel position) are
//! orthogonal and tracked independently; both feed dashboard buckets.

use serde::{Deserialize, Serialize};

/// Approval workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProposalStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

/// Sales funnel stage (contact → negotiation → won/lost)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProposalStage {
    Contact,
    Negotiation,
    Won,
    Lost,
}

/// Pre-sales proposal entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Proposal {
    pub id: i64,
    pub title: String,
    pub customer_id: i64,
    pub amount: f64,
    pub owner_user_id: Option<i64>,
    pub status: ProposalStatus,
    pub stage: ProposalStage,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create proposal payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalCreate {
    pub title: String,
    pub customer_id: i64,
    #[serde(default)]
    pub amount: f64,
    pub owner_user_id: Option<i64>,
}

/// Update proposal payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalUpdate {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub owner_user_id: Option<i64>,
    pub status: Option<ProposalStatus>,
    pub stage: Option<ProposalStage>,
}
