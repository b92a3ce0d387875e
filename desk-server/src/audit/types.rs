//! 审计日志类型定义
//!
//! 所有条目 append-only：应用层没有任何更新接口，删除只发生在
//! 保留期清理（retention sweep）。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
///
/// 按领域分组，确保每个敏感操作都有明确的类型标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 系统生命周期 ═══
    /// 系统启动
    SystemStartup,
    /// 系统关闭
    SystemShutdown,
    /// 保留期清理
    AuditRetentionSweep,

    // ═══ 认证 ═══
    /// 登录成功
    LoginSuccess,
    /// 登录失败
    LoginFailed,
    /// 权限缓存手动刷新
    PermissionsRefreshed,

    // ═══ 管理操作 ═══
    UserCreated,
    UserUpdated,
    UserDeactivated,
    UserRolesChanged,
    RoleCreated,
    RoleUpdated,
    RoleDeleted,
    RoleCoverageChanged,

    // ═══ CRM ═══
    CustomerCreated,
    CustomerUpdated,
    CustomerDeactivated,
    OrderCreated,
    OrderUpdated,
    OrderDeleted,

    // ═══ 支持工单 ═══
    CaseCreated,
    CaseUpdated,
    CaseStatusChanged,
    CaseAssigned,

    // ═══ 售前 / 交付 ═══
    ProposalCreated,
    ProposalUpdated,
    ProposalStatusChanged,
    ProposalStageChanged,
    ProposalDeleted,
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,

    // ═══ SLA 配置 ═══
    SlaThresholdCreated,
    SlaThresholdUpdated,
    SlaThresholdDeleted,

    // ═══ 附件 ═══
    FileUploaded,
    FileDeleted,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 审计日志条目（不可变）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    /// 自增序列号（唯一标识）
    pub id: i64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    /// 操作类型
    pub action: AuditAction,
    /// 资源类型（如 "case", "role", "system"）
    pub resource_type: String,
    /// 资源 ID
    pub resource_id: String,
    /// 操作人 ID（系统事件为 None）
    pub operator_id: Option<i64>,
    /// 操作人名称
    pub operator_name: Option<String>,
    /// 结构化详情（JSON 快照或字段 diff）
    #[sqlx(json)]
    pub details: serde_json::Value,
    /// 保留期截止（过期后由后台清理删除）
    pub retention_until: i64,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 操作类型过滤
    pub action: Option<AuditAction>,
    /// 操作人 ID 过滤
    pub operator_id: Option<i64>,
    /// 资源类型过滤
    pub resource_type: Option<String>,
    /// 分页偏移
    #[serde(default)]
    pub offset: i64,
    /// 分页大小（默认 50）
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            action: None,
            operator_id: None,
            resource_type: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

/// 审计日志列表响应
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: i64,
}
