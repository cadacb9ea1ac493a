use http::StatusCode;
use thiserror::Error;

/// 对象存储调用错误。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("request signing failed: {0}")]
    Signing(#[from] rsa::signature::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    #[error("endpoint {0} cannot be used as a base url")]
    InvalidEndpoint(String),

    #[error("object storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("object storage returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}
