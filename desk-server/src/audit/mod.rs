//! Audit Logging
//!
//! Append-only 审计日志：mpsc 通道 + 后台 worker 落库，
//! 查询直接读存储，保留期清理由定时任务驱动。

pub mod diff;
pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use diff::{create_diff, create_snapshot};
pub use service::{AuditLogRequest, AuditService};
pub use storage::{AuditStorage, AuditStorageError};
pub use types::{AuditAction, AuditEntry, AuditListResponse, AuditQuery};
pub use worker::AuditWorker;
