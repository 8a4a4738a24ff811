//! # Gateway API
//!
//! n8n 任务网关的 HTTP 层，基于 Axum。
//!
//! ## API 端点
//!
//! 以下路由同时挂在根路径和 `/v1` 下：
//! - `POST /jobs` - 受理任务，后台分发到 n8n webhook，返回 202
//! - `POST /jobs/{job_id}/cancel` - kill-switch，停用任务所属的工作流
//! - `POST /callbacks`（别名 `/callbacks/n8n`）- 接收 n8n 完成回调并写审计日志
//!
//! 另有 `GET /health` 与 `GET /meta`。
//!
//! ## 错误响应
//!
//! ```json
//! {
//!   "detail": "Unknown workflow_key",
//!   "error": { "type": "BAD_REQUEST", "code": 400, "timestamp": "2024-01-01T00:00:00Z" }
//! }
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod signature;

use axum::Router;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
pub use routes::{create_routes, AppState};
pub use signature::{compute_signature, CallbackVerifier, SignatureError};

/// 创建完整的API应用
pub fn create_app(state: AppState) -> Router {
    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
