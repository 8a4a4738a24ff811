//! 网关的外部依赖实现：n8n REST 客户端和 SQLite 审计日志。

pub mod audit_writer;
pub mod n8n_client;

pub use audit_writer::{AuditRow, AuditWriter};
pub use n8n_client::N8nClient;
