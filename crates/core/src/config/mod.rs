//! 网关配置
//!
//! 配置来源按优先级从低到高：内置默认值、TOML 配置文件、进程环境变量。

pub mod app_config;

pub use app_config::AppConfig;
