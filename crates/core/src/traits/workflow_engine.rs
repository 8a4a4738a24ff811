//! 外部工作流引擎（n8n）接口
//!
//! kill-switch 只依赖这个端口，具体的 HTTP 实现位于 infrastructure crate。

use async_trait::async_trait;
use serde_json::Value;

use crate::GatewayResult;

#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// 是否配置了调用 REST API 所需的凭证
    fn is_configured(&self) -> bool;

    /// `GET /workflows`，返回原始响应体，由调用方解析列表结构
    async fn list_workflows(&self) -> GatewayResult<Value>;

    /// `PATCH /workflows/{id}`，请求体为 `{"active": <active>}`
    async fn set_workflow_active(&self, workflow_id: &str, active: bool) -> GatewayResult<()>;
}
