//! Dashboard Metrics Model
//!
//! A point-in-time projection over cases, proposals and projects.
//! Never a source of truth, always re-derivable from the aggregates.

use serde::{Deserialize, Serialize};

/// One GROUP BY bucket (status, priority or stage value → row count)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BucketCount {
    pub key: String,
    pub count: i64,
}

/// Case-side metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseMetrics {
    pub total: i64,
    pub open: i64,
    pub resolved: i64,
    pub by_status: Vec<BucketCount>,
    pub by_priority: Vec<BucketCount>,
    /// Cases carrying an SLA deadline at all
    pub with_sla_deadline: i64,
    /// Resolved at-or-before their deadline
    pub within_sla: i64,
    /// Still open and already past their deadline
    pub open_breached: i64,
    /// resolved / total, 0 when total == 0
    pub resolution_rate: f64,
    /// within_sla / with_sla_deadline, 0 when no deadlines are tracked
    pub sla_compliance_rate: f64,
}

/// Proposal-side metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalMetrics {
    pub total: i64,
    pub by_status: Vec<BucketCount>,
    pub by_stage: Vec<BucketCount>,
}

/// Project-side metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub total: i64,
    pub by_status: Vec<BucketCount>,
}

/// Full dashboard snapshot payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub computed_at: i64,
    pub cases: CaseMetrics,
    pub proposals: ProposalMetrics,
    pub projects: ProjectMetrics,
}

/// Persisted snapshot row (optional history; `metrics` is the JSON payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DashboardSnapshot {
    pub id: i64,
    pub computed_at: i64,
    pub scope_role_id: Option<i64>,
    pub scope_customer_id: Option<i64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub metrics: DashboardMetrics,
}
