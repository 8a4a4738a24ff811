pub mod callback;
pub mod engine;
pub mod job;

pub use callback::{AuditEntry, CallbackStatus, JobCallback};
pub use engine::EngineWorkflow;
pub use job::{JobCancelRequest, JobCancelResponse, JobRequest, JobResponse, JobStatus};
