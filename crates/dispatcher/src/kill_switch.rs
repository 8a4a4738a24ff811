use std::sync::Arc;

use gateway_core::{GatewayError, GatewayResult, WorkflowEngine};
use gateway_domain::{JobCancelRequest, JobCancelResponse};
use tracing::{error, info, warn};

use crate::workflow_lookup::find_workflow_id;

/// kill-switch 各阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSwitchStage {
    /// 检查 n8n API 凭证
    Precondition,
    /// 列出工作流并匹配 registry key
    Lookup,
    /// 把匹配到的工作流置为 inactive
    Deactivate,
}

impl KillSwitchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            KillSwitchStage::Precondition => "precondition",
            KillSwitchStage::Lookup => "lookup",
            KillSwitchStage::Deactivate => "deactivate",
        }
    }
}

/// 通过停用整个工作流来取消任务
///
/// 作用范围是工作流而不是单个任务，网关并不知道某个 job_id 是否真的在运行。
pub struct KillSwitch {
    engine: Arc<dyn WorkflowEngine>,
}

impl KillSwitch {
    pub fn new(engine: Arc<dyn WorkflowEngine>) -> Self {
        Self { engine }
    }

    pub async fn cancel(
        &self,
        job_id: &str,
        request: &JobCancelRequest,
    ) -> GatewayResult<JobCancelResponse> {
        let workflow_key = request.workflow_key.as_str();

        // 1. precondition
        if !self.engine.is_configured() {
            warn!(
                job_id,
                client_id = %request.client_id,
                workflow_key,
                stage = KillSwitchStage::Precondition.as_str(),
                "kill-switch unavailable: n8n API key missing"
            );
            return Err(GatewayError::EngineCredentialMissing);
        }

        // 2. lookup
        let workflow_id = self
            .engine
            .list_workflows()
            .await
            .and_then(|payload| find_workflow_id(&payload, workflow_key))
            .map_err(|e| self.upstream_failure(KillSwitchStage::Lookup, job_id, request, e))?;

        let Some(workflow_id) = workflow_id else {
            warn!(
                job_id,
                client_id = %request.client_id,
                workflow_key,
                stage = KillSwitchStage::Lookup.as_str(),
                "workflow not found in n8n"
            );
            return Err(GatewayError::WorkflowNotFound {
                workflow_key: workflow_key.to_string(),
            });
        };

        // 3. deactivate
        self.engine
            .set_workflow_active(&workflow_id, false)
            .await
            .map_err(|e| self.upstream_failure(KillSwitchStage::Deactivate, job_id, request, e))?;

        info!(
            job_id,
            client_id = %request.client_id,
            workflow_key,
            workflow_id = %workflow_id,
            reason = request.reason.as_deref().unwrap_or(""),
            "workflow deactivated"
        );

        Ok(JobCancelResponse::deactivated(job_id))
    }

    /// 上游故障统一映射为 `Upstream`，原因只写日志
    fn upstream_failure(
        &self,
        stage: KillSwitchStage,
        job_id: &str,
        request: &JobCancelRequest,
        cause: GatewayError,
    ) -> GatewayError {
        error!(
            job_id,
            client_id = %request.client_id,
            workflow_key = %request.workflow_key,
            stage = stage.as_str(),
            error = %cause,
            "kill-switch upstream call failed"
        );
        match cause {
            GatewayError::Upstream(_) => cause,
            other => GatewayError::upstream(format!("{} 阶段失败: {other}", stage.as_str())),
        }
    }
}
