use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// n8n 上报的完成状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Success,
    Failed,
}

impl CallbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackStatus::Success => "success",
            CallbackStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CallbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 工作流执行过程中单个节点的审计轨迹
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub node_name: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    #[serde(default)]
    pub duration_ms: u64,
}

/// n8n 回调载荷，每个任务完成时收到一次
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobCallback {
    pub job_id: String,
    pub status: CallbackStatus,
    #[serde(default)]
    pub outputs: Map<String, Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_id: Option<String>,
}

impl JobCallback {
    /// 审计记录：回调全部字段加上 `stored_at`
    ///
    /// 顶层字段按键名排序，序列化结果稳定。
    pub fn audit_record(
        &self,
        stored_at: DateTime<Utc>,
    ) -> serde_json::Result<BTreeMap<String, Value>> {
        let mut record: BTreeMap<String, Value> = match serde_json::to_value(self)? {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        record.insert(
            "stored_at".to_string(),
            serde_json::to_value(stored_at)?,
        );
        Ok(record)
    }
}
