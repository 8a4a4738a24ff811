use std::path::PathBuf;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use gateway_core::GatewayResult;
use gateway_domain::JobCallback;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info};

const CREATE_AUDIT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS audit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stored_at TEXT NOT NULL,
    job_id TEXT NOT NULL,
    status TEXT NOT NULL,
    payload_json TEXT NOT NULL
)
"#;

/// 审计表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRow {
    pub id: i64,
    pub stored_at: String,
    pub job_id: String,
    pub status: String,
    pub payload: Value,
}

/// 回调审计日志写入器（SQLite，只追加）
///
/// 进程内所有写入通过同一把互斥锁串行化，跨进程依赖 SQLite 自身的文件锁。
/// 数据库文件和所在目录在第一次写入时创建。
pub struct AuditWriter {
    path: PathBuf,
    pool: Mutex<Option<SqlitePool>>,
}

impl AuditWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: Mutex::new(None),
        }
    }

    async fn connect(&self) -> GatewayResult<SqlitePool> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_AUDIT_TABLE).execute(&pool).await?;
        debug!(path = %self.path.display(), "audit database ready");
        Ok(pool)
    }

    /// 追加一条审计记录，返回写入的数据库路径
    pub async fn persist(&self, callback: &JobCallback) -> GatewayResult<PathBuf> {
        let stored_at = Utc::now();
        let record = callback.audit_record(stored_at)?;
        let payload_json = serde_json::to_string(&record)?;
        let stored_at = stored_at.to_rfc3339_opts(SecondsFormat::AutoSi, true);

        {
            let mut guard = self.pool.lock().await;
            if guard.is_none() {
                *guard = Some(self.connect().await?);
            }
            if let Some(pool) = guard.as_ref() {
                sqlx::query(
                    "INSERT INTO audit_logs (stored_at, job_id, status, payload_json) VALUES (?, ?, ?, ?)",
                )
                .bind(&stored_at)
                .bind(&callback.job_id)
                .bind(callback.status.as_str())
                .bind(&payload_json)
                .execute(pool)
                .await?;
            }
        }

        info!(
            job_id = %callback.job_id,
            status = %callback.status,
            execution_id = callback.execution_id.as_deref().unwrap_or(""),
            "audit persisted"
        );

        Ok(self.path.clone())
    }

    /// 按写入顺序读回全部审计记录
    pub async fn records(&self) -> GatewayResult<Vec<AuditRow>> {
        let mut guard = self.pool.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        let Some(pool) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            "SELECT id, stored_at, job_id, status, payload_json FROM audit_logs ORDER BY id",
        )
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| {
                let payload_json: String = row.try_get("payload_json")?;
                Ok(AuditRow {
                    id: row.try_get("id")?,
                    stored_at: row.try_get("stored_at")?,
                    job_id: row.try_get("job_id")?,
                    status: row.try_get("status")?,
                    payload: serde_json::from_str(&payload_json)?,
                })
            })
            .collect()
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
        }
    }
}
