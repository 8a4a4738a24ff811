use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use gateway_core::{AppConfig, GatewayResult, WorkflowEngine, WorkflowRegistry};
use gateway_dispatcher::{JobDispatcher, KillSwitch, RateLimiter};
use gateway_infrastructure::{AuditWriter, N8nClient};

use crate::handlers::{
    callbacks::receive_callback,
    health::{health_check, meta},
    jobs::{cancel_job, create_job},
};
use crate::signature::CallbackVerifier;

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<WorkflowRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub dispatcher: Arc<JobDispatcher>,
    pub kill_switch: Arc<KillSwitch>,
    pub verifier: Arc<CallbackVerifier>,
    pub audit_writer: Arc<AuditWriter>,
}

impl AppState {
    /// 按配置组装全部组件，kill-switch 使用真实的 n8n REST 客户端
    pub fn from_config(config: AppConfig, registry: WorkflowRegistry) -> GatewayResult<Self> {
        let engine: Arc<dyn WorkflowEngine> = Arc::new(N8nClient::from_config(&config)?);
        Self::with_engine(config, registry, engine)
    }

    pub fn with_engine(
        config: AppConfig,
        registry: WorkflowRegistry,
        engine: Arc<dyn WorkflowEngine>,
    ) -> GatewayResult<Self> {
        let dispatcher = JobDispatcher::new(&config.n8n_webhook_base_url, config.n8n_timeout())?;

        Ok(Self {
            rate_limiter: Arc::new(RateLimiter::new(config.jobs_rate_limit_per_minute)),
            dispatcher: Arc::new(dispatcher),
            kill_switch: Arc::new(KillSwitch::new(engine)),
            verifier: Arc::new(CallbackVerifier::new(config.callback_signing_secret.clone())),
            audit_writer: Arc::new(AuditWriter::new(&config.audit_db_path)),
            registry: Arc::new(registry),
            config: Arc::new(config),
        })
    }
}

/// 任务与回调路由，同时挂在根路径和 `/v1` 下
fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/{job_id}/cancel", post(cancel_job))
        .route("/callbacks", post(receive_callback))
        .route("/callbacks/n8n", post(receive_callback))
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/meta", get(meta))
        .merge(gateway_routes())
        .nest("/v1", gateway_routes())
        .with_state(state)
}
