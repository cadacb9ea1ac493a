//! 环境快照模块
//!
//! 平台提供的按键查询接口对某些键会返回空值或错误值，
//! 因此这里从不按键查询，而是一次性导出整张环境表作为不透明文本，
//! 之后的所有字段都从这份文本中解析。

use super::error::CredentialError;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::io;

/// 环境表的数据源。
#[cfg_attr(test, mockall::automock)]
pub trait EnvironmentSource {
    /// 返回整张环境表的文本表示。
    fn dump(&self) -> io::Result<String>;
}

/// 当前进程的环境表。
///
/// 一次遍历整张 `environ` 表，按 `/proc/<pid>/environ` 的布局输出
/// `KEY=value\0` 序列。
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn dump(&self) -> io::Result<String> {
        let mut text = String::new();
        for (key, value) in std::env::vars_os() {
            text.push_str(&key.to_string_lossy());
            text.push('=');
            text.push_str(&value.to_string_lossy());
            text.push('\0');
        }
        Ok(text)
    }
}

/// 某一时刻环境表的不可变文本快照。
///
/// 快照中含有私钥等机密内容，`Debug` 输出只显示长度。
pub struct EnvironmentSnapshot {
    text: SecretString,
}

impl EnvironmentSnapshot {
    /// 从当前进程导出快照。每个进程启动时只应调用一次。
    pub fn capture() -> Result<Self, CredentialError> {
        Self::capture_from(&ProcessEnvironment)
    }

    /// 从指定数据源导出快照。
    ///
    /// # Errors
    ///
    /// 仅当数据源本身失败时返回 `SnapshotUnavailable`；
    /// 个别键缺失要到字段解析阶段才会发现。
    pub fn capture_from(source: &dyn EnvironmentSource) -> Result<Self, CredentialError> {
        let text = source.dump().map_err(CredentialError::SnapshotUnavailable)?;
        tracing::debug!(bytes = text.len(), "已导出环境快照");
        Ok(Self::from_text(text))
    }

    /// 直接用一段文本构造快照（测试和回放平台导出内容时使用）。
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: SecretString::new(text.into()),
        }
    }

    pub(crate) fn expose(&self) -> &str {
        self.text.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.expose().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl fmt::Debug for EnvironmentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentSnapshot")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
