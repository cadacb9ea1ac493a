//! Vault 密钥模块
//!
//! 用同一份签名凭据从 OCI Vault 读取密钥，目前只用来获取数据库连接信息。

pub mod client;
pub mod credentials;
pub mod error;

pub use client::SecretsClient;
pub use credentials::DbCredentials;
pub use error::VaultError;
