//! 审计日志 SQLite 存储层
//!
//! Append-only 设计：仅提供 `append`、`query` 和保留期清理，
//! 没有任何更新接口。

use sqlx::SqlitePool;
use thiserror::Error;

use super::types::{AuditAction, AuditEntry, AuditQuery};

/// 存储错误
#[derive(Debug, Error)]
pub enum AuditStorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for AuditStorageError {
    fn from(err: sqlx::Error) -> Self {
        AuditStorageError::Database(err.to_string())
    }
}

pub type AuditStorageResult<T> = Result<T, AuditStorageError>;

const AUDIT_SELECT: &str = "SELECT id, timestamp, action, resource_type, resource_id, operator_id, operator_name, details, retention_until FROM audit_log";

/// 审计日志存储 (SQLite)
#[derive(Clone)]
pub struct AuditStorage {
    pool: SqlitePool,
}

impl AuditStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 追加一条审计日志
    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        action: AuditAction,
        resource_type: String,
        resource_id: String,
        operator_id: Option<i64>,
        operator_name: Option<String>,
        details: serde_json::Value,
        retention_until: i64,
    ) -> AuditStorageResult<AuditEntry> {
        let timestamp = shared::util::now_millis();
        let details_json = serde_json::to_string(&details)?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO audit_log (timestamp, action, resource_type, resource_id, operator_id, operator_name, details, retention_until) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(timestamp)
        .bind(action)
        .bind(&resource_type)
        .bind(&resource_id)
        .bind(operator_id)
        .bind(&operator_name)
        .bind(&details_json)
        .bind(retention_until)
        .fetch_one(&self.pool)
        .await?;

        Ok(AuditEntry {
            id,
            timestamp,
            action,
            resource_type,
            resource_id,
            operator_id,
            operator_name,
            details,
            retention_until,
        })
    }

    /// 查询审计日志（过滤 + 分页），返回 (items, total)
    pub async fn query(&self, q: &AuditQuery) -> AuditStorageResult<(Vec<AuditEntry>, i64)> {
        let mut conditions = Vec::new();

        if q.from.is_some() {
            conditions.push("timestamp >= ?");
        }
        if q.to.is_some() {
            conditions.push("timestamp <= ?");
        }
        if q.action.is_some() {
            conditions.push("action = ?");
        }
        if q.operator_id.is_some() {
            conditions.push("operator_id = ?");
        }
        if q.resource_type.is_some() {
            conditions.push("resource_type = ?");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM audit_log{where_clause}");
        let select_sql =
            format!("{AUDIT_SELECT}{where_clause} ORDER BY id DESC LIMIT ? OFFSET ?");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, AuditEntry>(&select_sql);

        if let Some(from) = q.from {
            count_query = count_query.bind(from);
            select_query = select_query.bind(from);
        }
        if let Some(to) = q.to {
            count_query = count_query.bind(to);
            select_query = select_query.bind(to);
        }
        if let Some(action) = q.action {
            count_query = count_query.bind(action);
            select_query = select_query.bind(action);
        }
        if let Some(operator_id) = q.operator_id {
            count_query = count_query.bind(operator_id);
            select_query = select_query.bind(operator_id);
        }
        if let Some(ref resource_type) = q.resource_type {
            count_query = count_query.bind(resource_type);
            select_query = select_query.bind(resource_type);
        }

        let total = count_query.fetch_one(&self.pool).await?;
        let items = select_query
            .bind(q.limit.clamp(1, 500))
            .bind(q.offset.max(0))
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    /// 删除保留期已过的条目，返回删除数量
    ///
    /// 只有 `retention_until < now` 的行会被删除；与并发读取之间没有
    /// 互斥（过期行不会再被正常查询关心）。
    pub async fn purge_expired(&self, now: i64) -> AuditStorageResult<u64> {
        let rows = sqlx::query("DELETE FROM audit_log WHERE retention_until < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(rows.rows_affected())
    }
}
