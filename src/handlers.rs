//! HTTP请求处理模块
//!
//! 函数只暴露一个入口 `POST /call`，由 Fn 平台在每次调用时转发过来。

pub mod constants;
pub mod invoke;

// 重新导出主要的公共接口
pub use invoke::{CallResponse, handle_call};
