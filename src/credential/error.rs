//! 凭据物化过程中的错误类型。
//!
//! 所有错误在启动阶段都是致命的。错误信息只包含字段名和错误类别，
//! 永远不包含任何原始值（尤其是私钥内容）。

use std::fmt;
use thiserror::Error;

/// 错误类别，用于结构化诊断输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SnapshotUnavailable,
    MalformedSnapshot,
    MissingField,
    KeyFormatUnrecognized,
    KeyBodyInvalid,
    InvalidPrivateKey,
    IncompleteConfiguration,
    InvalidField,
    FingerprintMismatch,
    ValidationUnreachable,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::SnapshotUnavailable => "SnapshotUnavailable",
            ErrorKind::MalformedSnapshot => "MalformedSnapshot",
            ErrorKind::MissingField => "MissingField",
            ErrorKind::KeyFormatUnrecognized => "KeyFormatUnrecognized",
            ErrorKind::KeyBodyInvalid => "KeyBodyInvalid",
            ErrorKind::InvalidPrivateKey => "InvalidPrivateKey",
            ErrorKind::IncompleteConfiguration => "IncompleteConfiguration",
            ErrorKind::InvalidField => "InvalidField",
            ErrorKind::FingerprintMismatch => "FingerprintMismatch",
            ErrorKind::ValidationUnreachable => "ValidationUnreachable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 凭据物化错误。
#[derive(Debug, Error)]
pub enum CredentialError {
    /// 平台接口在导出环境表时失败。
    #[error("environment snapshot unavailable: {0}")]
    SnapshotUnavailable(#[source] std::io::Error),

    /// 快照文本不符合预期的 `KEY=value` 语法。
    #[error("malformed environment snapshot: {reason}")]
    MalformedSnapshot { reason: String },

    /// 必需字段缺失或为空，每个缺失字段各占一项。
    #[error("missing required field(s): {}", .fields.join(", "))]
    MissingField { fields: Vec<String> },

    /// 在扁平化的私钥字符串中找不到合法的头尾标记。
    #[error("private key header/footer not recognized: {reason}")]
    KeyFormatUnrecognized { reason: String },

    /// 去除空白后的私钥主体不是合法的 base64 数据。
    #[error("private key body is not valid base64: {reason}")]
    KeyBodyInvalid { reason: String },

    /// 标准解码器拒绝了重建后的私钥。
    #[error("private key rejected: {reason}")]
    InvalidPrivateKey { reason: String },

    /// 除私钥外的必需字段缺失。
    #[error("incomplete configuration, missing: {}", .fields.join(", "))]
    IncompleteConfiguration { fields: Vec<String> },

    /// 字段存在但格式不合法。
    #[error("field {field} is malformed: {reason}")]
    InvalidField { field: String, reason: String },

    /// 配置的指纹与私钥推导出的指纹不一致。
    #[error("configured key fingerprint does not match the private key")]
    FingerprintMismatch,

    /// 远程凭据校验在超时时间内无法完成。
    #[error("credential validation endpoint unreachable: {reason}")]
    ValidationUnreachable { reason: String },
}

impl CredentialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CredentialError::SnapshotUnavailable(_) => ErrorKind::SnapshotUnavailable,
            CredentialError::MalformedSnapshot { .. } => ErrorKind::MalformedSnapshot,
            CredentialError::MissingField { .. } => ErrorKind::MissingField,
            CredentialError::KeyFormatUnrecognized { .. } => ErrorKind::KeyFormatUnrecognized,
            CredentialError::KeyBodyInvalid { .. } => ErrorKind::KeyBodyInvalid,
            CredentialError::InvalidPrivateKey { .. } => ErrorKind::InvalidPrivateKey,
            CredentialError::IncompleteConfiguration { .. } => ErrorKind::IncompleteConfiguration,
            CredentialError::InvalidField { .. } => ErrorKind::InvalidField,
            CredentialError::FingerprintMismatch => ErrorKind::FingerprintMismatch,
            CredentialError::ValidationUnreachable { .. } => ErrorKind::ValidationUnreachable,
        }
    }

    /// 与该错误相关的字段名列表。
    ///
    /// 私钥相关的错误统一归到 `OCI_PRIVATE_KEY_CONTENT`，
    /// 指纹不匹配归到 `OCI_FINGERPRINT`。
    pub fn fields(&self) -> Vec<String> {
        use crate::config::keys::{OCI_FINGERPRINT, OCI_PRIVATE_KEY_CONTENT};

        match self {
            CredentialError::MissingField { fields }
            | CredentialError::IncompleteConfiguration { fields } => fields.clone(),
            CredentialError::InvalidField { field, .. } => vec![field.clone()],
            CredentialError::KeyFormatUnrecognized { .. }
            | CredentialError::KeyBodyInvalid { .. }
            | CredentialError::InvalidPrivateKey { .. } => {
                vec![OCI_PRIVATE_KEY_CONTENT.to_string()]
            }
            CredentialError::FingerprintMismatch => vec![OCI_FINGERPRINT.to_string()],
            CredentialError::SnapshotUnavailable(_)
            | CredentialError::MalformedSnapshot { .. }
            | CredentialError::ValidationUnreachable { .. } => Vec::new(),
        }
    }
}
