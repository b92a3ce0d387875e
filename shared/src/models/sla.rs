//! SLA Threshold Model

use super::CasePriority;
use serde::{Deserialize, Serialize};

/// Per-priority SLA threshold row.
///
/// Hours of 0 are legal and mean "due immediately". At most one active row
/// per priority is maintained at the application level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SlaThreshold {
    pub id: i64,
    pub priority: CasePriority,
    pub response_hours: i64,
    pub resolution_hours: i64,
    pub is_active: bool,
}

/// Create threshold payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaThresholdCreate {
    pub priority: CasePriority,
    pub response_hours: i64,
    pub resolution_hours: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Update threshold payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaThresholdUpdate {
    pub response_hours: Option<i64>,
    pub resolution_hours: Option<i64>,
    pub is_active: Option<bool>,
}
