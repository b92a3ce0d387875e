//! Support Case Model
//!
//! 状态机 + SLA 字段。`sla_deadline` 是派生值：创建时、优先级变更时、
//! SLA 配置变更时重新计算，其余时间只读。

use serde::{Deserialize, Serialize};

/// Case priority, drives the SLA threshold lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CasePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl CasePriority {
    pub const ALL: [CasePriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Case workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CaseStatus {
    New,
    InProgress,
    WaitingOnCustomer,
    Resolved,
    Closed,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::InProgress => "IN_PROGRESS",
            Self::WaitingOnCustomer => "WAITING_ON_CUSTOMER",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether the case still counts as open (unresolved) for SLA purposes
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Resolved | Self::Closed)
    }

    /// Legal workflow transitions.
    ///
    /// New → InProgress; InProgress ⇄ WaitingOnCustomer;
    /// InProgress → Resolved → Closed; Resolved → InProgress (reopen).
    pub fn can_transition_to(self, next: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (self, next),
            (New, InProgress)
                | (InProgress, WaitingOnCustomer)
                | (WaitingOnCustomer, InProgress)
                | (InProgress, Resolved)
                | (Resolved, Closed)
                | (Resolved, InProgress)
        )
    }
}

/// Support case entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SupportCase {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: CasePriority,
    pub status: CaseStatus,
    pub customer_id: i64,
    pub order_id: Option<i64>,
    pub assigned_user_id: Option<i64>,
    pub system_id: Option<i64>,
    pub component_id: Option<i64>,
    pub site_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub first_response_at: Option<i64>,
    pub resolved_at: Option<i64>,
    /// Derived resolution deadline (Unix millis); None = no SLA tracked
    pub sla_deadline: Option<i64>,
}

/// Create case payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseCreate {
    pub title: String,
    pub description: Option<String>,
    pub priority: CasePriority,
    pub customer_id: i64,
    pub order_id: Option<i64>,
    pub assigned_user_id: Option<i64>,
    pub system_id: Option<i64>,
    pub component_id: Option<i64>,
    pub site_id: Option<i64>,
}

/// Update case payload (status changes go through `CaseStatusChange`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<CasePriority>,
    pub order_id: Option<i64>,
    pub system_id: Option<i64>,
    pub component_id: Option<i64>,
    pub site_id: Option<i64>,
}

/// Status transition payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStatusChange {
    pub status: CaseStatus,
    pub note: Option<String>,
}

/// Assignment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAssign {
    /// None = unassign
    pub user_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_allows_the_documented_edges() {
        use CaseStatus::*;
        assert!(New.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(WaitingOnCustomer));
        assert!(WaitingOnCustomer.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Closed));
        assert!(Resolved.can_transition_to(InProgress));
    }

    #[test]
    fn status_machine_rejects_shortcuts() {
        use CaseStatus::*;
        assert!(!New.can_transition_to(Resolved));
        assert!(!New.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(InProgress));
        assert!(!WaitingOnCustomer.can_transition_to(Resolved));
        assert!(!InProgress.can_transition_to(InProgress));
    }

    #[test]
    fn open_states_for_sla() {
        use CaseStatus::*;
        assert!(New.is_open());
        assert!(InProgress.is_open());
        assert!(WaitingOnCustomer.is_open());
        assert!(!Resolved.is_open());
        assert!(!Closed.is_open());
    }
}
