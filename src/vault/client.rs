//! Vault 密钥客户端
//!
//! 调用 Secret Retrieval API 的 `GET /20190301/secretbundles/{secretId}`，
//! 请求签名与对象存储共用同一个 [`RequestSigner`]。

use super::credentials::DbCredentials;
use super::error::VaultError;
use crate::credential::Credential;
use crate::storage::{RequestSigner, StorageError};
use crate::storage::client::{api_url, error_for_status};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderMap, Method};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Secret Retrieval API 的版本路径
const API_VERSION: &str = "20190301";

/// 请求超时时间
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretBundle {
    secret_bundle_content: Option<SecretBundleContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretBundleContent {
    content_type: Option<String>,
    content: Option<String>,
}

/// Vault 密钥客户端
#[derive(Debug, Clone)]
pub struct SecretsClient {
    http: Client,
    endpoint: Url,
    signer: RequestSigner,
}

impl SecretsClient {
    /// 创建客户端。
    ///
    /// 未指定 `endpoint` 时使用凭据所在区域的公共端点。
    pub fn new(credential: Arc<Credential>, endpoint: Option<Url>) -> Result<Self, StorageError> {
        let endpoint = match endpoint {
            Some(url) => url,
            None => {
                let url = format!(
                    "https://secrets.vaults.{}.oci.oraclecloud.com",
                    credential.region()
                );
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

    /// 读取密钥当前版本的内容，返回 base64 解码后的文本。
    ///
    /// # Errors
    ///
    /// * `Api` - 请求失败或服务端返回非 2xx。
    /// * `EmptyBundle` / `ContentType` / `Base64` / `Utf8` - 返回的密钥内容无法使用。
    pub async fn get_secret_content(&self, secret_id: &str) -> Result<SecretString, VaultError> {
        let url = api_url(&self.endpoint, &[API_VERSION, "secretbundles", secret_id])?;
        let mut headers = HeaderMap::new();
        self.signer.sign(&Method::GET, &url, &mut headers, None)?;

        tracing::info!(secret_id, "正在从 Vault 读取密钥");
        let response = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(StorageError::from)?;
        let body = error_for_status(response).await?;

        let bundle: SecretBundle = serde_json::from_str(&body).map_err(StorageError::from)?;
        drop(body);

        let content = bundle
            .secret_bundle_content
            .ok_or_else(|| VaultError::EmptyBundle {
                secret_id: secret_id.to_string(),
            })?;
        if let Some(content_type) = content.content_type.filter(|t| t != "BASE64") {
            return Err(VaultError::ContentType(content_type));
        }
        let encoded = content
            .content
            .filter(|c| !c.is_empty())
            .map(SecretString::new)
            .ok_or_else(|| VaultError::EmptyBundle {
                secret_id: secret_id.to_string(),
            })?;

        let decoded = STANDARD
            .decode(encoded.expose_secret().trim())
            .map_err(|_| VaultError::Base64)?;
        let text = String::from_utf8(decoded).map_err(|_| VaultError::Utf8)?;
        Ok(SecretString::new(text))
    }

    /// 读取并解析数据库连接信息。
    pub async fn db_credentials(&self, secret_id: &str) -> Result<DbCredentials, VaultError> {
        let content = self.get_secret_content(secret_id).await?;
        DbCredentials::from_json(&content)
    }
}
