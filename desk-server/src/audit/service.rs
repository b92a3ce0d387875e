//! 审计日志服务
//!
//! `AuditService` 是审计日志的核心服务，提供：
//! - 日志写入（通过 mpsc 通道异步发送，后台 worker 落库）
//! - 日志查询（直接读取存储）
//! - 保留期清理入口（由后台定时任务调用）
//!
//! 写入是 best-effort 的：通道满或已关闭时丢弃并记录 tracing 错误，
//! 绝不阻塞或回滚触发它的业务操作。

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use super::storage::{AuditStorage, AuditStorageError, AuditStorageResult};
use super::types::*;

/// 发送到 AuditService 的日志请求
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
    pub details: serde_json::Value,
    pub retention_until: i64,
}

/// 审计日志服务
pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::Sender<AuditLogRequest>,
    /// 新条目的保留时长（毫秒）
    retention_ms: i64,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("retention_ms", &self.retention_ms)
            .finish_non_exhaustive()
    }
}

impl AuditService {
    /// 创建审计服务；返回的 Receiver 交给 [`super::AuditWorker`]
    pub fn new(
        pool: SqlitePool,
        retention_days: i64,
        buffer_size: usize,
    ) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let storage = AuditStorage::new(pool);
        let service = Arc::new(Self {
            storage,
            tx,
            retention_ms: shared::util::days_to_millis(retention_days),
        });
        (service, rx)
    }

    /// 异步记录审计日志（非阻塞，best-effort）
    ///
    /// 审计写入绝不拖住主操作：通道满时条目被丢弃并记录错误，
    /// 而不是等待。
    pub fn log(
        &self,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        operator_id: Option<i64>,
        operator_name: Option<String>,
        details: serde_json::Value,
    ) {
        let now = shared::util::now_millis();
        let req = AuditLogRequest {
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            operator_id,
            operator_name,
            details,
            retention_until: now + self.retention_ms,
        };

        if let Err(e) = self.tx.try_send(req) {
            tracing::error!(action = %action, error = %e, "Audit entry dropped");
        }
    }

    /// 直接写入审计日志（用于启动/关闭等同步场景）
    pub async fn log_sync(
        &self,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        details: serde_json::Value,
    ) -> Result<AuditEntry, AuditStorageError> {
        let retention_until = shared::util::now_millis() + self.retention_ms;
        self.storage
            .append(
                action,
                resource_type.into(),
                resource_id.into(),
                None,
                None,
                details,
                retention_until,
            )
            .await
    }

    /// 查询审计日志
    pub async fn query(&self, q: &AuditQuery) -> AuditStorageResult<(Vec<AuditEntry>, i64)> {
        self.storage.query(q).await
    }

    /// 清理保留期已过的条目
    pub async fn purge_expired(&self) -> AuditStorageResult<u64> {
        self.storage.purge_expired(shared::util::now_millis()).await
    }

    /// 获取存储引用
    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }
}
