use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use gateway_domain::{JobCancelRequest, JobCancelResponse, JobRequest, JobResponse, JobStatus};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    routes::AppState,
};

/// 受理任务并在后台分发到 n8n
///
/// 检查顺序：请求体、工作流注册表、超时上限、限流。应答不等待分发结果。
pub async fn create_job(
    State(state): State<AppState>,
    ValidatedJson(job): ValidatedJson<JobRequest>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let Some(workflow) = state.registry.get(&job.workflow_key) else {
        warn!(
            job_id = %job.job_id,
            client_id = %job.client_id,
            workflow_key = %job.workflow_key,
            "job rejected: unknown workflow_key"
        );
        return Err(ApiError::unknown_workflow());
    };
    let workflow_version = workflow.version.clone();

    let max_timeout = state.config.jobs_max_timeout_seconds;
    if job.exceeds_timeout(max_timeout) {
        warn!(
            job_id = %job.job_id,
            client_id = %job.client_id,
            workflow_key = %job.workflow_key,
            timeout_seconds = job.timeout_seconds,
            "job rejected: timeout too large"
        );
        return Err(ApiError::BadRequest(format!(
            "timeout_seconds exceeds maximum of {max_timeout}"
        )));
    }

    if !state.rate_limiter.admit(&job.client_id) {
        warn!(
            job_id = %job.job_id,
            client_id = %job.client_id,
            workflow_key = %job.workflow_key,
            "job rejected: rate limit exceeded"
        );
        return Err(ApiError::RateLimited);
    }

    let response = JobResponse::accepted(job.job_id.clone(), Utc::now());

    info!(
        job_id = %job.job_id,
        client_id = %job.client_id,
        workflow_key = %job.workflow_key,
        workflow_version = %workflow_version,
        status = %JobStatus::Pending,
        "job accepted"
    );

    state.dispatcher.spawn(job);

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// kill-switch：停用任务所属的整个工作流
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    ValidatedJson(request): ValidatedJson<JobCancelRequest>,
) -> ApiResult<Json<JobCancelResponse>> {
    if !state.registry.exists(&request.workflow_key) {
        warn!(
            job_id = %job_id,
            client_id = %request.client_id,
            workflow_key = %request.workflow_key,
            "cancel rejected: unknown workflow_key"
        );
        return Err(ApiError::unknown_workflow());
    }

    let response = state.kill_switch.cancel(&job_id, &request).await?;
    Ok(Json(response))
}
