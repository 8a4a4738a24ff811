#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use gateway_api::{create_app, AppState};
use gateway_core::{AppConfig, WorkflowMetadata, WorkflowRegistry};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub fn registry() -> WorkflowRegistry {
    WorkflowRegistry::new(vec![
        WorkflowMetadata {
            key: "example_workflow".to_string(),
            name: "Example Workflow".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        },
        WorkflowMetadata {
            key: "tiktok_live_helper".to_string(),
            name: "TikTok Live Helper".to_string(),
            version: "1.0.0".to_string(),
            description: Some("Live stream assistant".to_string()),
        },
    ])
}

/// 默认指向一个不存在的 n8n，审计库放在临时目录
pub fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        n8n_webhook_base_url: "http://127.0.0.1:9/webhook".to_string(),
        n8n_api_base_url: "http://127.0.0.1:9/api/v1".to_string(),
        n8n_api_key: None,
        n8n_timeout_seconds: 2,
        audit_db_path: dir
            .path()
            .join("data")
            .join("audit.db")
            .to_string_lossy()
            .into_owned(),
        ..AppConfig::default()
    }
}

pub fn app_with_state(config: AppConfig) -> (Router, AppState) {
    let state = AppState::from_config(config, registry()).unwrap();
    (create_app(state.clone()), state)
}

pub fn job_payload(job_id: &str, client_id: &str, workflow_key: &str) -> Value {
    json!({
        "job_id": job_id,
        "client_id": client_id,
        "workflow_key": workflow_key,
        "inputs": {"foo": "bar"},
        "callback_url": "https://example.com/callback"
    })
}

pub async fn send(
    app: &Router,
    uri: &str,
    body: impl Into<Body>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let response = app
        .clone()
        .oneshot(builder.body(body.into()).unwrap())
        .await
        .unwrap();
    read(response).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(app, uri, body.to_string(), &[]).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// 假的 n8n：webhook 与 REST API 都记录收到的请求
#[derive(Clone, Default)]
pub struct FakeN8n {
    pub webhooks: Arc<Mutex<Vec<(String, Value)>>>,
    pub patches: Arc<Mutex<Vec<(String, Value)>>>,
    pub list_calls: Arc<Mutex<usize>>,
    pub api_keys: Arc<Mutex<Vec<Option<String>>>>,
    pub workflows: Arc<Mutex<Value>>,
    pub list_status: Arc<Mutex<Option<StatusCode>>>,
    pub patch_status: Arc<Mutex<Option<StatusCode>>>,
    /// webhook 记录请求后再等待这么久才应答
    pub webhook_delay: Arc<Mutex<Duration>>,
}

impl FakeN8n {
    pub fn with_workflows(workflows: Value) -> Self {
        let fake = Self::default();
        *fake.workflows.lock().unwrap() = workflows;
        fake
    }

    /// 启动服务，返回 `(webhook_base_url, api_base_url)`
    pub async fn start(&self) -> (String, String) {
        let app = Router::new()
            .route("/webhook/{key}", post(webhook))
            .route("/api/v1/workflows", get(list))
            .route("/api/v1/workflows/{id}", patch(update))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (
            format!("http://{addr}/webhook"),
            format!("http://{addr}/api/v1"),
        )
    }

    pub fn with_webhook_delay(delay: Duration) -> Self {
        let fake = Self::default();
        *fake.webhook_delay.lock().unwrap() = delay;
        fake
    }

    pub async fn wait_for_webhooks(&self, count: usize) -> Vec<(String, Value)> {
        for _ in 0..100 {
            {
                let calls = self.webhooks.lock().unwrap();
                if calls.len() >= count {
                    return calls.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.webhooks.lock().unwrap().clone()
    }
}

fn api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-n8n-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn webhook(
    State(fake): State<FakeN8n>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    fake.webhooks.lock().unwrap().push((key, body));
    let delay = *fake.webhook_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    StatusCode::OK
}

async fn list(State(fake): State<FakeN8n>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    *fake.list_calls.lock().unwrap() += 1;
    fake.api_keys.lock().unwrap().push(api_key(&headers));
    let status = fake.list_status.lock().unwrap().unwrap_or(StatusCode::OK);
    let workflows = fake.workflows.lock().unwrap().clone();
    (status, Json(workflows))
}

async fn update(
    State(fake): State<FakeN8n>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    fake.api_keys.lock().unwrap().push(api_key(&headers));
    fake.patches.lock().unwrap().push((id, body));
    fake.patch_status.lock().unwrap().unwrap_or(StatusCode::OK)
}
