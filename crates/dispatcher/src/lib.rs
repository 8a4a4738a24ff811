//! 请求准入与分发
//!
//! - [`RateLimiter`]: 按 client_id 的滑动窗口限流
//! - [`workflow_lookup`]: registry key 到 n8n 工作流 id 的匹配
//! - [`JobDispatcher`]: 向 n8n webhook 的单次、即发即忘投递
//! - [`KillSwitch`]: 列出、匹配、停用三阶段的取消流程

pub mod job_dispatcher;
pub mod kill_switch;
pub mod rate_limiter;
pub mod workflow_lookup;

pub use job_dispatcher::JobDispatcher;
pub use kill_switch::{KillSwitch, KillSwitchStage};
pub use rate_limiter::{RateLimiter, RATE_LIMIT_WINDOW};
pub use workflow_lookup::find_workflow_id;
