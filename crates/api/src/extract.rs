use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::error::ApiError;

pub const INVALID_REQUEST_PAYLOAD: &str = "Invalid request payload";

/// 反序列化并校验 JSON 请求体
///
/// 缺字段、多余字段、类型错误或校验规则失败一律返回 422。
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!(error = %rejection.body_text(), "request body rejected");
            ApiError::UnprocessableEntity(INVALID_REQUEST_PAYLOAD)
        })?;

        value.validate().map_err(|errors| {
            debug!(error = %errors, "request body failed validation");
            ApiError::UnprocessableEntity(INVALID_REQUEST_PAYLOAD)
        })?;

        Ok(ValidatedJson(value))
    }
}
