use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::GatewayError;
use serde_json::json;
use tracing::error;

use crate::signature::SignatureError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("签名校验失败: {0}")]
    Unauthorized(#[from] SignatureError),

    #[error("请求过于频繁")]
    RateLimited,

    /// 422 的 detail 只给出固定文案，不回显解析器内部信息
    #[error("请求体无效: {0}")]
    UnprocessableEntity(&'static str),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unknown_workflow() -> Self {
        Self::BadRequest("Unknown workflow_key".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Gateway(GatewayError::EngineCredentialMissing) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Gateway(GatewayError::WorkflowNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Gateway(e) if e.is_upstream_failure() => StatusCode::BAD_GATEWAY,
            ApiError::Gateway(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (detail, error_type) = match &self {
            ApiError::BadRequest(msg) => (msg.clone(), "BAD_REQUEST"),
            ApiError::Unauthorized(e) => (e.to_string(), "INVALID_SIGNATURE"),
            ApiError::RateLimited => ("Rate limit exceeded".to_string(), "RATE_LIMITED"),
            ApiError::UnprocessableEntity(msg) => (msg.to_string(), "VALIDATION_ERROR"),
            ApiError::Gateway(GatewayError::EngineCredentialMissing) => (
                GatewayError::EngineCredentialMissing.to_string(),
                "ENGINE_NOT_CONFIGURED",
            ),
            ApiError::Gateway(GatewayError::WorkflowNotFound { .. }) => {
                ("Workflow not found in n8n".to_string(), "WORKFLOW_NOT_FOUND")
            }
            ApiError::Gateway(e) if e.is_upstream_failure() => (
                "Failed to deactivate workflow via n8n".to_string(),
                "UPSTREAM_ERROR",
            ),
            ApiError::Gateway(_) | ApiError::Internal(_) => {
                error!(error = %self, "request failed with internal error");
                ("Internal server error".to_string(), "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "detail": detail,
            "error": {
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_status_mapping() {
        assert_eq!(
            ApiError::from(GatewayError::EngineCredentialMissing).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(GatewayError::WorkflowNotFound {
                workflow_key: "wf".to_string()
            })
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(GatewayError::upstream("HTTP 500")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(GatewayError::protocol("bad shape")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(GatewayError::Configuration("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_error_statuses() {
        assert_eq!(ApiError::unknown_workflow().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::from(SignatureError::Missing).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::UnprocessableEntity("Invalid request payload").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
