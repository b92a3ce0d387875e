//! Dashboard Aggregation
//!
//! Point-in-time projection over cases, proposals and projects, optionally
//! scoped to a set of customers (role coverage or a single customer).
//! Read-only; snapshot persistence is an optional side effect.

use super::{RepoError, RepoResult};
use shared::models::{
    BucketCount, CaseMetrics, CoverageScope, DashboardMetrics, DashboardSnapshot, ProjectMetrics,
    ProposalMetrics,
};
use sqlx::SqlitePool;

/// numerator / denominator, 0 on an empty denominator (never a fault)
pub fn rate(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn in_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Append the customer scope to a WHERE fragment. `AllCustomers` adds
/// nothing: the empty coverage set means unrestricted, and that inversion
/// was already resolved by `CoverageScope::from_customer_ids`.
fn scope_fragment(scope: &CoverageScope) -> Option<String> {
    match scope {
        CoverageScope::AllCustomers => None,
        CoverageScope::Customers(ids) => {
            Some(format!("customer_id IN ({})", in_placeholders(ids.len())))
        }
    }
}

fn scope_ids(scope: &CoverageScope) -> &[i64] {
    match scope {
        CoverageScope::AllCustomers => &[],
        CoverageScope::Customers(ids) => ids,
    }
}

/// COUNT(*) over `table` with an optional extra condition plus the scope.
async fn scoped_count(
    pool: &SqlitePool,
    table: &str,
    condition: Option<&str>,
    scope: &CoverageScope,
) -> RepoResult<i64> {
    let mut conditions: Vec<String> = Vec::new();
    if let Some(c) = condition {
        conditions.push(c.to_string());
    }
    if let Some(s) = scope_fragment(scope) {
        conditions.push(s);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!("SELECT COUNT(*) FROM {table}{where_clause}");

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in scope_ids(scope) {
        query = query.bind(*id);
    }
    Ok(query.fetch_one(pool).await?)
}

/// GROUP BY bucket counts over `column` in `table`, within scope.
async fn scoped_buckets(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    scope: &CoverageScope,
) -> RepoResult<Vec<BucketCount>> {
    let where_clause = match scope_fragment(scope) {
        Some(s) => format!(" WHERE {s}"),
        None => String::new(),
    };
    let sql = format!(
        "SELECT {column} AS key, COUNT(*) AS count FROM {table}{where_clause} GROUP BY {column} ORDER BY {column}"
    );

    let mut query = sqlx::query_as::<_, BucketCount>(&sql);
    for id in scope_ids(scope) {
        query = query.bind(*id);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn case_metrics(
    pool: &SqlitePool,
    scope: &CoverageScope,
    now: i64,
) -> RepoResult<CaseMetrics> {
    let total = scoped_count(pool, "support_case", None, scope).await?;
    let open = scoped_count(
        pool,
        "support_case",
        Some("status NOT IN ('RESOLVED', 'CLOSED')"),
        scope,
    )
    .await?;
    let resolved = scoped_count(pool, "support_case", Some("resolved_at IS NOT NULL"), scope).await?;
    let with_sla_deadline =
        scoped_count(pool, "support_case", Some("sla_deadline IS NOT NULL"), scope).await?;
    let within_sla = scoped_count(
        pool,
        "support_case",
        Some("resolved_at IS NOT NULL AND sla_deadline IS NOT NULL AND resolved_at <= sla_deadline"),
        scope,
    )
    .await?;

    // Still open, deadline already in the past
    let breach_cond = format!("resolved_at IS NULL AND sla_deadline IS NOT NULL AND sla_deadline < {now}");
    let open_breached = scoped_count(pool, "support_case", Some(&breach_cond), scope).await?;

    let by_status = scoped_buckets(pool, "support_case", "status", scope).await?;
    let by_priority = scoped_buckets(pool, "support_case", "priority", scope).await?;

    Ok(CaseMetrics {
        total,
        open,
        resolved,
        by_status,
        by_priority,
        with_sla_deadline,
        within_sla,
        open_breached,
        resolution_rate: rate(resolved, total),
        sla_compliance_rate: rate(within_sla, with_sla_deadline),
    })
}

pub async fn proposal_metrics(
    pool: &SqlitePool,
    scope: &CoverageScope,
) -> RepoResult<ProposalMetrics> {
    Ok(ProposalMetrics {
        total: scoped_count(pool, "proposal", None, scope).await?,
        by_status: scoped_buckets(pool, "proposal", "status", scope).await?,
        by_stage: scoped_buckets(pool, "proposal", "stage", scope).await?,
    })
}

pub async fn project_metrics(
    pool: &SqlitePool,
    scope: &CoverageScope,
) -> RepoResult<ProjectMetrics> {
    Ok(ProjectMetrics {
        total: scoped_count(pool, "project", None, scope).await?,
        by_status: scoped_buckets(pool, "project", "status", scope).await?,
    })
}

/// Full snapshot computation. Each bucket query runs independently against
/// current table state; nothing here writes.
pub async fn compute(
    pool: &SqlitePool,
    scope: &CoverageScope,
    now: i64,
) -> RepoResult<DashboardMetrics> {
    Ok(DashboardMetrics {
        computed_at: now,
        cases: case_metrics(pool, scope, now).await?,
        proposals: proposal_metrics(pool, scope).await?,
        projects: project_metrics(pool, scope).await?,
    })
}

/// Persist a computed snapshot (optional history, never a source of truth)
pub async fn insert_snapshot(
    pool: &SqlitePool,
    scope_role_id: Option<i64>,
    scope_customer_id: Option<i64>,
    metrics: &DashboardMetrics,
) -> RepoResult<DashboardSnapshot> {
    let id = shared::util::snowflake_id();
    let metrics_json = serde_json::to_string(metrics)
        .map_err(|e| RepoError::Database(format!("Failed to serialize metrics: {e}")))?;

    sqlx::query(
        "INSERT INTO dashboard_metric (id, computed_at, scope_role_id, scope_customer_id, metrics) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(metrics.computed_at)
    .bind(scope_role_id)
    .bind(scope_customer_id)
    .bind(metrics_json)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, DashboardSnapshot>(
        "SELECT id, computed_at, scope_role_id, scope_customer_id, metrics FROM dashboard_metric WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| RepoError::Database("Failed to persist snapshot".into()))
}

pub async fn list_snapshots(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<DashboardSnapshot>> {
    let rows = sqlx::query_as::<_, DashboardSnapshot>(
        "SELECT id, computed_at, scope_role_id, scope_customer_id, metrics FROM dashboard_metric ORDER BY computed_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_guards_division_by_zero() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(1, 4), 0.25);
    }

    #[test]
    fn all_customers_scope_adds_no_filter() {
        assert_eq!(scope_fragment(&CoverageScope::AllCustomers), None);
        assert_eq!(
            scope_fragment(&CoverageScope::Customers(vec![1, 2, 3])),
            Some("customer_id IN (?, ?, ?)".to_string())
        );
    }
}
