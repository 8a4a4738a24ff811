use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use validator::{Validate, ValidationError};

pub const DEFAULT_PRIORITY: i64 = 5;
pub const DEFAULT_TIMEOUT_SECONDS: i64 = 300;

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

fn default_timeout_seconds() -> i64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// 回调地址只接受带主机名的 http/https URL
fn validate_http_url(url: &Url) -> Result<(), ValidationError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::new("callback_url 必须是 http 或 https 地址"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::new("callback_url 缺少主机名"));
    }
    Ok(())
}

/// 任务生命周期状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 创建任务的请求体
///
/// 只在一次请求及其后台分发期间存在，不做持久化。
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobRequest {
    #[validate(length(min = 1))]
    pub job_id: String,
    #[validate(length(min = 1))]
    pub client_id: String,
    #[validate(length(min = 1))]
    pub workflow_key: String,
    pub inputs: Map<String, Value>,
    #[validate(custom(function = "validate_http_url"))]
    pub callback_url: Url,
    #[serde(default = "default_priority")]
    #[validate(range(min = 1, max = 10))]
    pub priority: i64,
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1))]
    pub timeout_seconds: i64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl JobRequest {
    pub fn exceeds_timeout(&self, max_timeout_seconds: u64) -> bool {
        u64::try_from(self.timeout_seconds).map_or(false, |t| t > max_timeout_seconds)
    }
}

/// 创建任务的同步应答
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub message: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl JobResponse {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            message: None,
            accepted_at: None,
            estimated_completion: None,
        }
    }

    /// 已受理、等待 n8n 执行的应答
    pub fn accepted(job_id: impl Into<String>, accepted_at: DateTime<Utc>) -> Self {
        Self {
            message: Some("accepted".to_string()),
            accepted_at: Some(accepted_at),
            ..Self::new(job_id, JobStatus::Pending)
        }
    }
}

/// kill-switch 请求体
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobCancelRequest {
    #[validate(length(min = 1))]
    pub workflow_key: String,
    #[validate(length(min = 1))]
    pub client_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobCancelResponse {
    /// 路径参数的回显，网关并不跟踪具体任务是否在该工作流中运行
    pub job_id: String,
    pub status: JobStatus,
    pub workflow_deactivated: bool,
    pub message: Option<String>,
}

impl JobCancelResponse {
    pub fn deactivated(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Cancelled,
            workflow_deactivated: true,
            message: Some("workflow deactivated".to_string()),
        }
    }
}
