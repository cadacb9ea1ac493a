//! 日志初始化
//!
//! 启动时调用一次。过滤指令和输出格式都来自环境快照里的 [`Settings`](crate::config::Settings)。

use crate::config::{DEFAULT_LOG_FILTER, LogFormat};
use anyhow::Result;
use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// 构造过滤器，指令无法解析时退回默认级别。
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// 安装全局日志订阅器。
///
/// # Errors
///
/// 已经安装过订阅器时返回错误。
pub fn init(directive: &str, format: LogFormat) -> Result<()> {
    let filter = env_filter(directive);

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_timer(UtcTime::rfc_3339())
                .with_current_span(true)
                .with_span_list(false)
                .with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
        LogFormat::Text => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_timer(UtcTime::rfc_3339())
                .with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
    }
    Ok(())
}
