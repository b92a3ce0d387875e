//! SLA Computation
//!
//! Deadline and breach arithmetic over Unix-millisecond timestamps. Pure
//! functions; the threshold table is loaded by callers (handlers load it
//! once per request, the dashboard never needs it since breach state is read
//! from the stored deadline).
//!
//! A missing active threshold for a priority means "no SLA tracked": the
//! deadline is None, which is NOT the same thing as "deadline met".

use shared::models::{CasePriority, SlaThreshold, SupportCase};

/// created_at + resolution window. Zero hours is legal ("due immediately").
pub fn compute_deadline(created_at: i64, resolution_hours: i64) -> i64 {
    created_at + shared::util::hours_to_millis(resolution_hours)
}

/// The active threshold row for a priority, if any
pub fn active_threshold(
    priority: CasePriority,
    thresholds: &[SlaThreshold],
) -> Option<&SlaThreshold> {
    thresholds
        .iter()
        .find(|t| t.is_active && t.priority == priority)
}

/// Resolution deadline for a new/re-prioritized case. None = no SLA tracked.
pub fn deadline_for(
    priority: CasePriority,
    created_at: i64,
    thresholds: &[SlaThreshold],
) -> Option<i64> {
    active_threshold(priority, thresholds).map(|t| compute_deadline(created_at, t.resolution_hours))
}

/// Strictly-after comparison: exactly on the deadline is NOT a breach.
pub fn is_breached(deadline: i64, at: i64) -> bool {
    at > deadline
}

/// Point-in-time SLA evaluation of one case
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SlaStatus {
    pub resolution_deadline: Option<i64>,
    pub response_deadline: Option<i64>,
    /// resolved_at (or now, while open) is strictly past the deadline
    pub resolution_breached: bool,
    /// first_response_at (or now, while unanswered) is strictly past the
    /// response deadline, evaluated independently of resolution
    pub response_breached: bool,
}

/// Evaluate both breach flags for a case at time `now`.
///
/// The response deadline always derives from the SAME threshold row as the
/// resolution deadline; when no row is active neither is tracked.
pub fn evaluate(case: &SupportCase, thresholds: &[SlaThreshold], now: i64) -> SlaStatus {
    let threshold = active_threshold(case.priority, thresholds);

    let resolution_deadline = case.sla_deadline;
    let resolution_breached = match resolution_deadline {
        Some(deadline) => is_breached(deadline, case.resolved_at.unwrap_or(now)),
        None => false,
    };

    let response_deadline =
        threshold.map(|t| compute_deadline(case.created_at, t.response_hours));
    let response_breached = match response_deadline {
        Some(deadline) => is_breached(deadline, case.first_response_at.unwrap_or(now)),
        None => false,
    };

    SlaStatus {
        resolution_deadline,
        response_deadline,
        resolution_breached,
        response_breached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CaseStatus, SlaThresholdCreate};

    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn threshold(priority: CasePriority, response: i64, resolution: i64) -> SlaThreshold {
        SlaThreshold {
            id: 1,
            priority,
            response_hours: response,
            resolution_hours: resolution,
            is_active: true,
        }
    }

    fn case_at(created_at: i64, priority: CasePriority) -> SupportCase {
        SupportCase {
            id: 1,
            title: "printer on fire".into(),
            description: None,
            priority,
            status: CaseStatus::New,
            customer_id: 10,
            order_id: None,
            assigned_user_id: None,
            system_id: None,
            component_id: None,
            site_id: None,
            created_at,
            updated_at: created_at,
            first_response_at: None,
            resolved_at: None,
            sla_deadline: None,
        }
    }

    #[test]
    fn deadline_is_creation_plus_resolution_hours() {
        let t = 1_700_000_000_000;
        let table = vec![threshold(CasePriority::High, 4, 24)];
        assert_eq!(
            deadline_for(CasePriority::High, t, &table),
            Some(t + 24 * HOUR_MS)
        );
    }

    #[test]
    fn no_active_threshold_means_no_deadline() {
        let table = vec![threshold(CasePriority::High, 4, 24)];
        assert_eq!(deadline_for(CasePriority::Low, 0, &table), None);

        let mut inactive = table.clone();
        inactive[0].is_active = false;
        assert_eq!(deadline_for(CasePriority::High, 0, &inactive), None);
    }

    #[test]
    fn breach_is_strictly_after() {
        let deadline = 1_700_000_000_000;
        assert!(is_breached(deadline, deadline + 1_000));
        assert!(!is_breached(deadline, deadline - 1_000));
        assert!(!is_breached(deadline, deadline));
    }

    #[test]
    fn zero_hours_means_due_immediately() {
        let t = 1_700_000_000_000;
        let table = vec![threshold(CasePriority::Critical, 0, 0)];
        assert_eq!(deadline_for(CasePriority::Critical, t, &table), Some(t));
        // Due immediately: one millisecond later is already a breach
        assert!(is_breached(t, t + 1));
    }

    #[test]
    fn response_and_resolution_breach_are_independent() {
        let t = 1_700_000_000_000;
        let table = vec![threshold(CasePriority::High, 1, 24)];

        let mut case = case_at(t, CasePriority::High);
        case.sla_deadline = deadline_for(CasePriority::High, t, &table);
        // Responded late (2h), resolved in time (3h)
        case.first_response_at = Some(t + 2 * HOUR_MS);
        case.resolved_at = Some(t + 3 * HOUR_MS);

        let status = evaluate(&case, &table, t + 3 * HOUR_MS);
        assert!(status.response_breached);
        assert!(!status.resolution_breached);
    }

    #[test]
    fn open_case_breaches_against_now() {
        let t = 1_700_000_000_000;
        let table = vec![threshold(CasePriority::Medium, 2, 8)];

        let mut case = case_at(t, CasePriority::Medium);
        case.sla_deadline = deadline_for(CasePriority::Medium, t, &table);

        let before = evaluate(&case, &table, t + 7 * HOUR_MS);
        assert!(!before.resolution_breached);

        let after = evaluate(&case, &table, t + 9 * HOUR_MS);
        assert!(after.resolution_breached);
    }

    #[test]
    fn untracked_priority_never_breaches() {
        let t = 1_700_000_000_000;
        let case = case_at(t, CasePriority::Low);
        let status = evaluate(&case, &[], t + 1_000 * HOUR_MS);
        assert_eq!(status.resolution_deadline, None);
        assert!(!status.resolution_breached);
        assert!(!status.response_breached);
    }

    #[test]
    fn create_payload_default_is_active() {
        let data: SlaThresholdCreate = serde_json::from_str(
            r#"{"priority": "HIGH", "response_hours": 4, "resolution_hours": 24}"#,
        )
        .unwrap();
        assert!(data.is_active);
    }
}
