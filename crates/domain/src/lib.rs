//! 网关数据模型
//!
//! 所有入站载荷都是严格模式：出现未知字段直接拒绝。

pub mod models;

pub use models::*;
