use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::routes::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": state.config.service_name,
        "version": state.config.service_version
    }))
}

/// 服务元数据
pub async fn meta(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service_name": state.config.service_name,
        "version": state.config.service_version,
        "build_sha": state.config.build_sha,
        "env": state.config.app_env
    }))
}
