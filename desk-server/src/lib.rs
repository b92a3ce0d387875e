//! Desk Server - 客户支持与售前管理后端
//!
//! # 架构概述
//!
//! - **认证与授权** (`auth`): JWT 认证、页面权限模型（编解码 + 决策引擎 + 缓存）
//! - **数据库** (`db`): SQLite (sqlx) 存储与仓库层
//! - **SLA** (`sla`): 截止时间与违约计算
//! - **审计** (`audit`): append-only 审计日志 + 保留期清理
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! desk-server/src/
//! ├── core/          # 配置、状态、服务器生命周期、后台任务
//! ├── auth/          # JWT 认证、页面权限
//! ├── db/            # 数据库层（连接池、仓库、种子数据）
//! ├── sla/           # SLA 计算
//! ├── audit/         # 审计日志
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志、校验工具
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod sla;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Audit logging macro - 非阻塞发送到审计通道 (best-effort)
#[macro_export]
macro_rules! audit_log {
    ($service:expr, $action:expr, $resource_type:expr, $resource_id:expr, operator_id = $operator_id:expr, operator_name = $operator_name:expr, details = $details:expr) => {
        $service.log(
            $action,
            $resource_type,
            $resource_id,
            $operator_id,
            $operator_name,
            $details,
        )
    };
}

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在不是错误
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____  _____ _____ __ __
   / __ \/ ____/ ___// //_/
  / / / / __/  \__ \/ ,<
 / /_/ / /___ ___/ / /| |
/_____/_____//____/_/ |_|
   _____ __________ _    ______________
  / ___// ____/ __ \ |  / / ____/ __ \
  \__ \/ __/ / /_/ / | / / __/ / /_/ /
 ___/ / /___/ _, _/| |/ / /___/ _, _/
/____/_____/_/ |_| |___/_____/_/ |_|
    "#
    );
}
