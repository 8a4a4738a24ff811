use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use gateway_api::{create_app, AppState};
use gateway_core::{AppConfig, WorkflowRegistry};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod shutdown;

use shutdown::ShutdownManager;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .about("n8n 任务分发网关")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径（默认查找 config/gateway.toml）"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置中的 app_log_level")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"])
                .default_value("pretty"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("监听地址，覆盖配置中的 app_host"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("监听端口，覆盖配置中的 app_port")
                .value_parser(clap::value_parser!(u16)),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let config = AppConfig::load(config_path)
        .context("加载配置失败")?
        .with_listen_overrides(
            matches.get_one::<String>("host").map(String::as_str),
            matches.get_one::<u16>("port").copied(),
        )?;

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.app_log_level.clone());
    let log_format = matches
        .get_one::<String>("log-format")
        .map(String::as_str)
        .unwrap_or("pretty");
    init_logging(&log_level, log_format)?;

    info!(
        service = %config.service_name,
        version = %config.service_version,
        env = %config.app_env,
        "starting n8n job gateway"
    );

    // 注册表加载失败时直接退出
    let registry = WorkflowRegistry::load(&config.registry_path)
        .with_context(|| format!("加载工作流注册表失败: {}", config.registry_path))?;

    if config.n8n_api_key.is_none() {
        warn!("N8N_API_KEY is not configured; kill-switch requests will return 503");
    }
    if config.callback_signing_secret.is_none() {
        warn!("callback signing secret not configured; callbacks will not be verified");
    }

    let bind_address = config.bind_address();
    let state = AppState::from_config(config, registry).context("初始化应用状态失败")?;
    let audit_writer = state.audit_writer.clone();
    let app = create_app(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("绑定地址失败: {bind_address}"))?;
    let addr = listener.local_addr().context("读取监听地址失败")?;
    info!(address = %addr, "gateway listening");

    let shutdown_manager = ShutdownManager::new();
    {
        let shutdown_manager = shutdown_manager.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            info!("收到关闭信号，开始优雅关闭...");
            shutdown_manager.shutdown().await;
        });
    }

    let graceful = {
        let shutdown_manager = shutdown_manager.clone();
        async move { shutdown_manager.wait().await }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .await
    {
        error!(error = %e, "HTTP server error");
    }

    if tokio::time::timeout(Duration::from_secs(5), audit_writer.close())
        .await
        .is_err()
    {
        warn!("审计数据库关闭超时");
    }

    info!("n8n job gateway stopped");
    Ok(())
}

/// 初始化日志系统，`RUST_LOG` 优先于配置的级别
fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 等待 Ctrl+C 或 SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "安装Ctrl+C信号处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "安装SIGTERM信号处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
