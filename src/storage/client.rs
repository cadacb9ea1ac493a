//! 对象存储客户端
//!
//! 使用签名凭据直接调用 OCI 对象存储的 REST 接口。

use super::error::StorageError;
use super::signer::RequestSigner;
use crate::credential::{Credential, CredentialError};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

/// 普通请求的超时时间
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 启动时凭据校验的超时时间
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// 错误响应体在错误信息中保留的最大长度
const MAX_ERROR_BODY: usize = 512;

/// 对象写入接口，处理器只依赖这个接口。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 把 `body` 写入 `namespace/bucket/object`。
    async fn put_object(
        &self,
        namespace: &str,
        bucket: &str,
        object: &str,
        body: Vec<u8>,
    ) -> Result<(), StorageError>;
}

/// OCI 对象存储客户端
#[derive(Debug, Clone)]
pub struct ObjectStorageClient {
    http: Client,
    endpoint: Url,
    signer: RequestSigner,
}

impl ObjectStorageClient {
    /// 创建客户端。
    ///
    /// 未指定 `endpoint` 时使用凭据所在区域的公共端点。
    pub fn new(credential: Arc<Credential>, endpoint: Option<Url>) -> Result<Self, StorageError> {
        let endpoint = match endpoint {
            Some(url) => url,
            None => {
                let url = format!("https://objectstorage.{}.oraclecloud.com", credential.region());
                Url::parse(&url).map_err(|_| StorageError::InvalidEndpoint(url))?
            }
        };
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::InvalidEndpoint(endpoint.to_string()));
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            endpoint,
            signer: RequestSigner::new(credential),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn credential(&self) -> &Credential {
        self.signer.credential()
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        api_url(&self.endpoint, segments)
    }

    /// 获取租户的对象存储命名空间。
    pub async fn get_namespace(&self) -> Result<String, StorageError> {
        self.get_namespace_with_timeout(REQUEST_TIMEOUT).await
    }

    async fn get_namespace_with_timeout(&self, timeout: Duration) -> Result<String, StorageError> {
        let url = self.url(&["n", ""])?;
        let mut headers = HeaderMap::new();
        self.signer.sign(&Method::GET, &url, &mut headers, None)?;

        let response = self
            .http
            .get(url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await?;
        let body = error_for_status(response).await?;
        Ok(serde_json::from_str::<String>(&body)?)
    }

    /// 发起一次有超时限制的签名请求，确认平台接受这份凭据。
    ///
    /// # Errors
    ///
    /// * `InvalidPrivateKey` - 服务端以 401/403 拒绝签名。
    /// * `ValidationUnreachable` - 超时、连接失败或其他非预期响应。
    pub async fn validate_credential(&self, timeout: Duration) -> Result<String, CredentialError> {
        match self.get_namespace_with_timeout(timeout).await {
            Ok(namespace) => Ok(namespace),
            Err(StorageError::Status { status, .. })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                Err(CredentialError::InvalidPrivateKey {
                    reason: format!("object storage rejected the signing key ({status})"),
                })
            }
            Err(e) => Err(CredentialError::ValidationUnreachable {
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ObjectStore for ObjectStorageClient {
    async fn put_object(
        &self,
        namespace: &str,
        bucket: &str,
        object: &str,
        body: Vec<u8>,
    ) -> Result<(), StorageError> {
        let url = self.url(&["n", namespace, "b", bucket, "o", object])?;

        let content_type = mime_guess::from_path(object).first_or_octet_stream();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type.as_ref())?);
        self.signer
            .sign(&Method::PUT, &url, &mut headers, Some(body.as_slice()))?;

        tracing::debug!(bucket, object, bytes = body.len(), "正在写入对象");
        let response = self.http.put(url).headers(headers).body(body).send().await?;
        error_for_status(response).await?;
        Ok(())
    }
}

/// 在端点后拼接 API 路径，每一段都会做百分号编码。
pub(crate) fn api_url(endpoint: &Url, segments: &[&str]) -> Result<Url, StorageError> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| StorageError::InvalidEndpoint(endpoint.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// 非 2xx 响应转换为错误，成功时返回响应体文本。
pub(crate) async fn error_for_status(response: reqwest::Response) -> Result<String, StorageError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }

    let mut message = body;
    if message.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    Err(StorageError::Status { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::ErrorKind;
    use crate::test_support::sample_credential;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ObjectStorageClient {
        let endpoint = Url::parse(&server.uri()).unwrap();
        ObjectStorageClient::new(sample_credential(), Some(endpoint)).unwrap()
    }

    #[test]
    fn test_default_endpoint_uses_region() {
        let client = ObjectStorageClient::new(sample_credential(), None).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://objectstorage.us-ashburn-1.oraclecloud.com/"
        );
    }

    #[tokio::test]
    async fn test_put_object_sends_signed_request() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/n/ns/b/bucket/o/hello.txt"))
            .and(header("content-type", "text/plain"))
            .and(header("x-content-sha256", "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ="))
            .and(header_exists("authorization"))
            .and(header_exists("date"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .put_object("ns", "bucket", "hello.txt", b"hello".to_vec())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0].headers["authorization"].to_str().unwrap();
        assert!(authorization.contains("algorithm=\"rsa-sha256\""));
        assert_eq!(requests[0].body, b"hello");
    }

    #[tokio::test]
    async fn test_put_object_encodes_object_name() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/n/ns/b/bucket/o/dir%2Fa%20b.json"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .put_object("ns", "bucket", "dir/a b.json", b"{}".to_vec())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_object_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(404).set_body_string("BucketNotFound"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .put_object("ns", "missing", "hello.txt", Vec::new())
            .await
            .unwrap_err();

        match err {
            StorageError::Status { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "BucketNotFound");
            }
            other => panic!("期望 Status 错误，实际为 {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/n/"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json("axaxnpcrorw5"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.get_namespace().await.unwrap(), "axaxnpcrorw5");
    }

    #[tokio::test]
    async fn test_validate_credential_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/n/"))
            .respond_with(ResponseTemplate::new(401).set_body_string("NotAuthenticated"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .validate_credential(VALIDATION_TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPrivateKey);
    }

    #[tokio::test]
    async fn test_validate_credential_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/n/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json("axaxnpcrorw5")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .validate_credential(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationUnreachable);
    }
}
