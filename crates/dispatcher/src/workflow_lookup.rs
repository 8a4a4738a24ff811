//! registry key 到 n8n 内部工作流 id 的解析
//!
//! 匹配规则是逐字比较且区分大小写：`name`、`displayName` 或 id 的字符串形式
//! 任意一个等于 key 即命中，按上游返回顺序取第一个命中项。不做 slug 归一化。

use gateway_core::{GatewayError, GatewayResult};
use gateway_domain::EngineWorkflow;
use serde_json::Value;
use tracing::debug;

/// 从 `GET /workflows` 的响应体中取出列表
///
/// 接受 `{"data": [...]}` 或裸列表，其它结构视为协议错误。
pub fn workflow_list(payload: &Value) -> GatewayResult<&Vec<Value>> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(GatewayError::protocol(
                "n8n workflow list response has no `data` array",
            )),
        },
        _ => Err(GatewayError::protocol(
            "n8n workflow list response is not list-shaped",
        )),
    }
}

pub fn matches_key(workflow: &EngineWorkflow, id: &str, workflow_key: &str) -> bool {
    workflow.name() == Some(workflow_key)
        || workflow.display_name() == Some(workflow_key)
        || id == workflow_key
}

/// 找到第一个匹配的工作流 id；没有匹配返回 `Ok(None)`
pub fn find_workflow_id(payload: &Value, workflow_key: &str) -> GatewayResult<Option<String>> {
    for (position, item) in workflow_list(payload)?.iter().enumerate() {
        let workflow = match serde_json::from_value::<EngineWorkflow>(item.clone()) {
            Ok(workflow) => workflow,
            Err(e) => {
                debug!(position, error = %e, "skipping unparseable n8n workflow entry");
                continue;
            }
        };
        // 没有可用 id 的条目无法停用
        let Some(id) = workflow.id_string() else {
            debug!(position, id = %workflow.id, "skipping n8n workflow entry without usable id");
            continue;
        };
        if matches_key(&workflow, &id, workflow_key) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}
