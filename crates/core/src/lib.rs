pub mod config;
pub mod errors;
pub mod registry;
pub mod traits;

pub use config::AppConfig;
pub use errors::*;
pub use registry::{WorkflowMetadata, WorkflowRegistry};
pub use traits::WorkflowEngine;

/// 所有出站 n8n 调用的默认超时时间（秒）
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 10;

/// 回调签名所在的请求头
pub const CALLBACK_SIGNATURE_HEADER: &str = "x-callback-signature";

/// n8n REST API 凭证请求头
pub const N8N_API_KEY_HEADER: &str = "X-N8N-API-KEY";
