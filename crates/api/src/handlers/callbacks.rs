use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use gateway_core::CALLBACK_SIGNATURE_HEADER;
use gateway_domain::JobCallback;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

pub const INVALID_CALLBACK_PAYLOAD: &str = "Invalid callback payload";

/// 接收 n8n 完成回调
///
/// 先对原始字节做签名校验，再解析；解析成功后写入审计日志。
pub async fn receive_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    // 非 ASCII 的头部值视为缺失
    let provided = headers
        .get(CALLBACK_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state.verifier.verify(&body, provided)?;

    let callback: JobCallback = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "callback payload rejected");
        ApiError::UnprocessableEntity(INVALID_CALLBACK_PAYLOAD)
    })?;

    info!(
        job_id = %callback.job_id,
        status = %callback.status,
        execution_id = callback.execution_id.as_deref().unwrap_or(""),
        "callback received"
    );

    state.audit_writer.persist(&callback).await.map_err(|e| {
        error!(job_id = %callback.job_id, error = %e, "audit write failed");
        ApiError::Internal("audit write failed".to_string())
    })?;

    Ok(Json(json!({"status": "ok"})))
}
