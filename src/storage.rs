//! 对象存储模块
//!
//! 该模块负责用签名凭据对请求签名，并与 OCI 对象存储交互。

pub mod client;
pub mod error;
pub mod signer;

pub use client::{ObjectStorageClient, ObjectStore};
#[cfg(test)]
pub use client::MockObjectStore;
pub use error::StorageError;
pub use signer::RequestSigner;
