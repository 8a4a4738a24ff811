use thiserror::Error;

/// 网关错误类型定义
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("工作流注册表错误: {0}")]
    Registry(String),

    /// 未配置 n8n API 凭证，kill-switch 无法调用上游
    #[error("N8N_API_KEY is not configured")]
    EngineCredentialMissing,

    #[error("工作流在 n8n 中不存在: {workflow_key}")]
    WorkflowNotFound { workflow_key: String },

    /// 上游返回了无法识别的载荷
    #[error("上游协议错误: {0}")]
    UpstreamProtocol(String),

    #[error("上游调用失败: {0}")]
    Upstream(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::UpstreamProtocol(message.into())
    }

    /// 上游故障（网络或协议），对调用方统一表现为网关错误
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::UpstreamProtocol(_))
    }
}

/// 统一的Result类型
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
