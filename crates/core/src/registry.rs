//! 工作流注册表
//!
//! 注册表在启动时从 JSON 文件加载一次，之后在进程生命周期内只读共享。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::{GatewayError, GatewayResult};

/// 注册表中的单个工作流条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub key: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    workflows: Vec<WorkflowMetadata>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    workflows: Vec<WorkflowMetadata>,
    index: HashMap<String, usize>,
}

impl WorkflowRegistry {
    pub fn new(workflows: Vec<WorkflowMetadata>) -> Self {
        let mut index = HashMap::with_capacity(workflows.len());
        for (position, entry) in workflows.iter().enumerate() {
            // 重复 key 以第一次出现为准
            index.entry(entry.key.clone()).or_insert(position);
        }
        Self { workflows, index }
    }

    /// 从磁盘加载注册表，文件缺失或格式错误都直接失败
    pub fn load(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GatewayError::Registry(format!(
                "注册表文件不存在: {}",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            workflows = registry.len(),
            "workflow registry loaded"
        );
        if registry.is_empty() {
            warn!(path = %path.display(), "workflow registry is empty; every job will be rejected");
        }
        Ok(registry)
    }

    pub fn from_json(raw: &str) -> GatewayResult<Self> {
        let document: RegistryDocument = serde_json::from_str(raw)
            .map_err(|e| GatewayError::Registry(format!("注册表解析失败: {e}")))?;
        Ok(Self::new(document.workflows))
    }

    pub fn exists(&self, workflow_key: &str) -> bool {
        self.index.contains_key(workflow_key)
    }

    pub fn get(&self, workflow_key: &str) -> Option<&WorkflowMetadata> {
        self.index
            .get(workflow_key)
            .map(|&position| &self.workflows[position])
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}
