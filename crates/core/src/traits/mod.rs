pub mod workflow_engine;

pub use workflow_engine::WorkflowEngine;
