use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::audit::{AuditLogRequest, AuditService};
use crate::auth::{JwtService, PermissionCache};
use crate::core::Config;
use crate::db::{DbService, seed};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | permission_cache | Arc<PermissionCache> | 权限解析缓存 |
/// | audit | Arc<AuditService> | 审计日志服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 权限解析缓存 (正缓存 5min / 负缓存 30s)
    pub permission_cache: Arc<PermissionCache>,
    /// 审计日志服务
    pub audit: Arc<AuditService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/desk.db) + 迁移 + 默认数据
    /// 3. 各服务 (JWT, 权限缓存, 审计)
    ///
    /// 返回的 Receiver 必须交给审计 worker（见 `Server::run`）。
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> (Self, mpsc::Receiver<AuditLogRequest>) {
        // 0. Ensure work_dir structure exists
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        // 1. Initialize DB
        let db_path = config.database_dir().join("desk.db");
        let db_path_str = db_path.to_string_lossy();

        let db_service = DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");
        let pool = db_service.pool;

        // 2. Seed built-in roles and the system admin account
        seed::ensure_defaults(&pool)
            .await
            .expect("Failed to seed default data");

        // 3. Initialize services
        let (audit, audit_rx) = AuditService::new(
            pool.clone(),
            config.audit_retention_days,
            config.audit_buffer_size,
        );
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let permission_cache = Arc::new(PermissionCache::new());

        let state = Self {
            config: config.clone(),
            pool,
            jwt_service,
            permission_cache,
            audit,
        };

        (state, audit_rx)
    }

    /// 测试用：基于已有连接池构造状态
    pub fn for_tests(config: Config, pool: SqlitePool) -> (Self, mpsc::Receiver<AuditLogRequest>) {
        let (audit, audit_rx) = AuditService::new(
            pool.clone(),
            config.audit_retention_days,
            config.audit_buffer_size,
        );
        let state = Self {
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            permission_cache: Arc::new(PermissionCache::new()),
            config,
            pool,
            audit,
        };
        (state, audit_rx)
    }
}
