//! Server Implementation
//!
//! HTTP 服务器启动和后台任务编排

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api;
use crate::audit::{AuditAction, AuditLogRequest, AuditWorker};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerState};

/// 审计保留期清理间隔（每日一次）
const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
    audit_rx: mpsc::Receiver<AuditLogRequest>,
}

impl Server {
    pub fn new(
        config: Config,
        state: ServerState,
        audit_rx: mpsc::Receiver<AuditLogRequest>,
    ) -> Self {
        Self {
            config,
            state,
            audit_rx,
        }
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            state,
            audit_rx,
        } = self;

        // ── Background tasks ────────────────────────────────────────
        let mut tasks = BackgroundTasks::new();

        // Audit worker: drains the mpsc channel into storage
        let worker = AuditWorker::new(state.audit.storage().clone());
        let worker_token = tasks.shutdown_token();
        tasks.spawn("audit_worker", TaskKind::Worker, async move {
            tokio::select! {
                _ = worker_token.cancelled() => {}
                _ = worker.run(audit_rx) => {}
            }
        });

        // Retention sweep: plain periodic task, no scheduler abstraction
        let audit = state.audit.clone();
        let sweep_token = tasks.shutdown_token();
        tasks.spawn("audit_retention_sweep", TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = sweep_token.cancelled() => break,
                    _ = interval.tick() => {
                        match audit.purge_expired().await {
                            Ok(0) => {
                                tracing::debug!("Audit retention sweep: nothing to purge");
                            }
                            Ok(deleted) => {
                                tracing::info!(deleted, "Audit retention sweep completed");
                                audit.log(
                                    AuditAction::AuditRetentionSweep,
                                    "system",
                                    "audit_log",
                                    None,
                                    None,
                                    serde_json::json!({ "deleted": deleted }),
                                );
                            }
                            Err(e) => {
                                tracing::error!("Audit retention sweep failed: {:?}", e);
                            }
                        }
                    }
                }
            }
        });

        tasks.log_summary();

        // Startup marker (synchronous write, must not race the worker)
        if let Err(e) = state
            .audit
            .log_sync(
                AuditAction::SystemStartup,
                "system",
                "server:main",
                serde_json::json!({ "environment": config.environment.clone() }),
            )
            .await
        {
            tracing::error!("Failed to record startup audit entry: {:?}", e);
        }

        // ── HTTP server ─────────────────────────────────────────────
        let app = api::build_app(&state).with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Desk Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;

        // Shutdown marker, then stop background tasks
        if let Err(e) = state
            .audit
            .log_sync(
                AuditAction::SystemShutdown,
                "system",
                "server:main",
                serde_json::json!({}),
            )
            .await
        {
            tracing::error!("Failed to record shutdown audit entry: {:?}", e);
        }

        tasks.shutdown().await;

        Ok(())
    }
}
