//! 工具函数模块
//!
//! 此模块包含了项目中使用的各种工具函数：
//! - HTTP头部处理工具（调用 ID 提取）

pub mod headers;
