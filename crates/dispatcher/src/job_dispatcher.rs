use std::sync::Arc;
use std::time::Duration;

use gateway_core::{GatewayError, GatewayResult};
use gateway_domain::{JobRequest, JobStatus};
use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 把任务投递到 n8n webhook 的分发器
///
/// 只尝试一次，没有重试、退避或死信队列。失败只记录日志，不会影响已经返回给
/// 调用方的 202 应答。以后如果需要更强的投递保证，应在 [`JobDispatcher::spawn`]
/// 这里换成持久化队列。
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    webhook_base_url: Url,
    http_client: reqwest::Client,
}

impl JobDispatcher {
    pub fn new(webhook_base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let webhook_base_url = Url::parse(webhook_base_url).map_err(|e| {
            GatewayError::Configuration(format!("无效的 webhook 地址 {webhook_base_url}: {e}"))
        })?;
        if webhook_base_url.cannot_be_a_base() {
            return Err(GatewayError::Configuration(format!(
                "webhook 地址不能作为基础路径: {webhook_base_url}"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            webhook_base_url,
            http_client,
        })
    }

    /// `{webhook_base_url}/{workflow_key}`，key 作为单独的路径段
    pub fn webhook_url(&self, workflow_key: &str) -> Url {
        let mut url = self.webhook_base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(workflow_key);
        }
        url
    }

    /// 在独立的 tokio 任务中分发，调用方通常直接丢弃返回的句柄
    pub fn spawn(self: &Arc<Self>, job: JobRequest) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(&job).await })
    }

    /// 永远正常返回；失败记录为结构化事件
    pub async fn dispatch(&self, job: &JobRequest) {
        match self.try_dispatch(job).await {
            Ok(()) => info!(
                job_id = %job.job_id,
                client_id = %job.client_id,
                workflow_key = %job.workflow_key,
                "job dispatched to n8n"
            ),
            Err(e) => {
                error!(
                    job_id = %job.job_id,
                    client_id = %job.client_id,
                    workflow_key = %job.workflow_key,
                    status = %JobStatus::Pending,
                    "n8n dispatch failed"
                );
                debug!(job_id = %job.job_id, error = %e, "dispatch exception");
            }
        }
    }

    pub async fn try_dispatch(&self, job: &JobRequest) -> GatewayResult<()> {
        let url = self.webhook_url(&job.workflow_key);

        let response = self
            .http_client
            .post(url.clone())
            .json(job)
            .send()
            .await
            .map_err(|e| GatewayError::upstream(format!("POST {url} 失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::upstream(format!(
                "POST {url} 返回 HTTP {status}"
            )));
        }
        Ok(())
    }
}
