use std::time::Duration;

use async_trait::async_trait;
use gateway_core::{AppConfig, GatewayError, GatewayResult, WorkflowEngine, N8N_API_KEY_HEADER};
use reqwest::Url;
use serde_json::{json, Value};
use tracing::debug;

/// n8n REST API 客户端
///
/// 每个请求都带固定超时，超时与网络错误同样处理。
#[derive(Debug, Clone)]
pub struct N8nClient {
    api_base_url: Url,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl N8nClient {
    pub fn new(api_base_url: &str, api_key: Option<String>, timeout: Duration) -> GatewayResult<Self> {
        let api_base_url = Url::parse(api_base_url).map_err(|e| {
            GatewayError::Configuration(format!("无效的 n8n API 地址 {api_base_url}: {e}"))
        })?;
        if api_base_url.cannot_be_a_base() {
            return Err(GatewayError::Configuration(format!(
                "n8n API 地址不能作为基础路径: {api_base_url}"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            api_base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            http_client,
        })
    }

    pub fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        Self::new(
            &config.n8n_api_base_url,
            config.n8n_api_key.clone(),
            config.n8n_timeout(),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(N8N_API_KEY_HEADER, key),
            None => request,
        }
    }
}

#[async_trait]
impl WorkflowEngine for N8nClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn list_workflows(&self) -> GatewayResult<Value> {
        let url = self.endpoint(&["workflows"]);
        debug!(url = %url, "listing n8n workflows");

        let response = self
            .authorized(self.http_client.get(url.clone()))
            .send()
            .await
            .map_err(|e| GatewayError::upstream(format!("GET {url} 失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::upstream(format!("GET {url} 返回 HTTP {status}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::protocol(format!("GET {url} 响应不是合法JSON: {e}")))
    }

    async fn set_workflow_active(&self, workflow_id: &str, active: bool) -> GatewayResult<()> {
        let url = self.endpoint(&["workflows", workflow_id]);
        debug!(url = %url, active, "updating n8n workflow active flag");

        let response = self
            .authorized(self.http_client.patch(url.clone()))
            .json(&json!({ "active": active }))
            .send()
            .await
            .map_err(|e| GatewayError::upstream(format!("PATCH {url} 失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::upstream(format!(
                "PATCH {url} 返回 HTTP {status}"
            )));
        }
        Ok(())
    }
}
