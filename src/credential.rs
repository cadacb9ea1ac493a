//! 凭据模块
//!
//! 该模块在冷启动时从平台环境中恢复签名凭据：导出环境快照、解析字段、
//! 修复被压平的私钥，并校验得到最终的 `Credential`。

pub mod error;
pub mod extract;
pub mod identity;
pub mod materialize;
pub mod repair;
pub mod snapshot;

pub use error::{CredentialError, ErrorKind};
pub use extract::{DuplicateField, ExtractedFields, extract, extract_optional};
pub use identity::{Credential, SigningAlgorithm, key_fingerprint};
pub use materialize::{materialize, materialize_from};
pub use repair::{KeyEncoding, ReconstructedKey, repair};
pub use snapshot::{EnvironmentSnapshot, EnvironmentSource, ProcessEnvironment};
