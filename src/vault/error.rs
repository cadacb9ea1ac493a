use crate::storage::StorageError;
use thiserror::Error;

/// 读取 Vault 密钥时的错误。
///
/// 错误信息只包含字段名和密钥 OCID，不包含密钥内容。
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("secret retrieval failed: {0}")]
    Api(#[from] StorageError),

    #[error("secret bundle {secret_id} has no content")]
    EmptyBundle { secret_id: String },

    #[error("unsupported secret content type {0}")]
    ContentType(String),

    #[error("secret content is not valid base64")]
    Base64,

    #[error("secret content is not valid utf-8")]
    Utf8,

    #[error("database credentials are malformed: {reason}")]
    Credentials { reason: String },
}
