use serde::{Deserialize, Serialize};
use serde_json::Value;

/// n8n `GET /workflows` 列表中的单个条目
///
/// 只解析匹配需要的字段，其余字段忽略。`name` 与 `displayName` 按原始 JSON
/// 保留，类型不对时只影响该字段的匹配。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineWorkflow {
    pub id: Value,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default, rename = "displayName")]
    pub display_name: Option<Value>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl EngineWorkflow {
    /// id 可能是字符串也可能是数字，统一转成字符串形式
    ///
    /// `null`、布尔、对象和数组都不是可用的 id，返回 `None`。
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_ref().and_then(Value::as_str)
    }
}
