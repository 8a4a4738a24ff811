use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 网关运行配置
///
/// 字段名与环境变量一一对应（`APP_PORT` -> `app_port`），
/// 因此环境变量不需要前缀和分隔符。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_env: String,
    pub app_host: String,
    pub app_port: u16,
    pub app_log_level: String,

    pub service_name: String,
    pub service_version: String,
    pub build_sha: String,

    pub n8n_webhook_base_url: String,
    pub n8n_api_base_url: String,
    pub n8n_api_key: Option<String>,
    pub n8n_timeout_seconds: u64,

    pub jobs_max_timeout_seconds: u64,
    /// 每个 client_id 每分钟允许的请求数，<= 0 表示关闭限流
    pub jobs_rate_limit_per_minute: i64,

    pub callback_signing_secret: Option<String>,

    pub audit_db_path: String,
    pub registry_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_env: "dev".to_string(),
            app_host: "127.0.0.1".to_string(),
            app_port: 8000,
            app_log_level: "info".to_string(),
            service_name: "n8n-job-gateway".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            build_sha: "local".to_string(),
            n8n_webhook_base_url: "http://127.0.0.1:5678/webhook".to_string(),
            n8n_api_base_url: "http://127.0.0.1:5678/api/v1".to_string(),
            n8n_api_key: None,
            n8n_timeout_seconds: crate::DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
            jobs_max_timeout_seconds: 300,
            jobs_rate_limit_per_minute: 60,
            callback_signing_secret: None,
            audit_db_path: "data/audit.db".to_string(),
            registry_path: "workflows/registry.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (no prefix) - highest priority
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, Environment::default())
    }

    /// 与 [`AppConfig::load`] 相同，但环境变量来源可替换（测试时注入固定映射）
    pub fn load_with_env(config_path: Option<&str>, env: Environment) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/gateway.toml", "gateway.toml"];
            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        // 环境变量保持原始字符串，数值字段在反序列化时再解析
        builder = builder.add_source(env.ignore_empty(true));

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// 空字符串的密钥视为未配置
    fn normalized(mut self) -> Self {
        self.n8n_api_key = self.n8n_api_key.filter(|v| !v.trim().is_empty());
        self.callback_signing_secret = self
            .callback_signing_secret
            .filter(|v| !v.trim().is_empty());
        self
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        if self.app_host.trim().is_empty() {
            return Err(anyhow::anyhow!("监听地址不能为空"));
        }

        if self.app_port == 0 {
            return Err(anyhow::anyhow!("端口号必须大于0"));
        }

        if self.n8n_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("n8n 调用超时时间必须大于0"));
        }

        if self.jobs_max_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("任务最大超时时间必须大于0"));
        }

        url::Url::parse(&self.n8n_webhook_base_url)
            .with_context(|| format!("无效的 n8n webhook 地址: {}", self.n8n_webhook_base_url))?;
        url::Url::parse(&self.n8n_api_base_url)
            .with_context(|| format!("无效的 n8n API 地址: {}", self.n8n_api_base_url))?;

        if self.audit_db_path.trim().is_empty() {
            return Err(anyhow::anyhow!("审计数据库路径不能为空"));
        }

        Ok(())
    }

    /// 应用命令行的监听地址覆盖，覆盖后重新校验
    pub fn with_listen_overrides(mut self, host: Option<&str>, port: Option<u16>) -> Result<Self> {
        if let Some(host) = host {
            self.app_host = host.to_string();
        }
        if let Some(port) = port {
            self.app_port = port;
        }
        self.validate().context("命令行参数校验失败")?;
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn n8n_timeout(&self) -> Duration {
        Duration::from_secs(self.n8n_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::default().source(Some(map))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.jobs_rate_limit_per_minute, 60);
        assert_eq!(config.jobs_max_timeout_seconds, 300);
        assert_eq!(config.n8n_timeout(), Duration::from_secs(10));
        assert!(config.n8n_api_key.is_none());
    }

    #[test]
    fn test_from_toml_partial_overrides() {
        let config = AppConfig::from_toml(
            r#"
            app_port = 9000
            jobs_rate_limit_per_minute = 5
            n8n_api_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.app_port, 9000);
        assert_eq!(config.jobs_rate_limit_per_minute, 5);
        assert_eq!(config.n8n_api_key.as_deref(), Some("abc"));
        assert_eq!(config.app_host, "127.0.0.1");
    }

    #[test]
    fn test_empty_secret_treated_as_absent() {
        let config = AppConfig::from_toml(
            r#"
            callback_signing_secret = "  "
            n8n_api_key = ""
            "#,
        )
        .unwrap();

        assert!(config.callback_signing_secret.is_none());
        assert!(config.n8n_api_key.is_none());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = AppConfig::from_toml(r#"n8n_api_base_url = "not a url""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let result = AppConfig::from_toml("app_port = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = AppConfig::load_with_env(Some("/nonexistent/gateway.toml"), env_from(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_port = 9100").unwrap();
        writeln!(file, "jobs_max_timeout_seconds = 120").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = AppConfig::load_with_env(
            Some(&path),
            env_from(&[
                ("APP_PORT", "9200"),
                ("CALLBACK_SIGNING_SECRET", "topsecret"),
                ("JOBS_RATE_LIMIT_PER_MINUTE", "0"),
            ]),
        )
        .unwrap();

        assert_eq!(config.app_port, 9200);
        assert_eq!(config.jobs_max_timeout_seconds, 120);
        assert_eq!(config.callback_signing_secret.as_deref(), Some("topsecret"));
        assert_eq!(config.jobs_rate_limit_per_minute, 0);
    }

    #[test]
    fn test_listen_overrides_are_validated() {
        let config = AppConfig::default()
            .with_listen_overrides(Some("0.0.0.0"), Some(9000))
            .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9000");

        let unchanged = AppConfig::default().with_listen_overrides(None, None).unwrap();
        assert_eq!(unchanged.bind_address(), "127.0.0.1:8000");

        assert!(AppConfig::default()
            .with_listen_overrides(None, Some(0))
            .is_err());
        assert!(AppConfig::default()
            .with_listen_overrides(Some("  "), None)
            .is_err());
    }

    #[test]
    fn test_environment_secrets_kept_verbatim() {
        let config = AppConfig::load_with_env(
            None,
            env_from(&[
                ("CALLBACK_SIGNING_SECRET", "0123456789"),
                ("N8N_API_KEY", "True"),
                ("APP_PORT", "8100"),
            ]),
        )
        .unwrap();

        assert_eq!(config.callback_signing_secret.as_deref(), Some("0123456789"));
        assert_eq!(config.n8n_api_key.as_deref(), Some("True"));
        assert_eq!(config.app_port, 8100);
    }

    #[test]
    fn test_toml_roundtrip_keeps_values() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.audit_db_path, config.audit_db_path);
        assert_eq!(parsed.registry_path, config.registry_path);
    }
}
