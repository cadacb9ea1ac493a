//! 请求签名模块
//!
//! 按 OCI 的 HTTP Signature 规范（draft-cavage，`rsa-sha256`）为请求签名。

use super::error::StorageError;
use crate::credential::Credential;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE, HOST};
use http::{HeaderMap, HeaderValue, Method};
use reqwest::Url;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// 请求体摘要头
pub const X_CONTENT_SHA256: &str = "x-content-sha256";

/// 没有指定 Content-Type 时使用的默认值
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// 请求签名器，持有进程内唯一的签名凭据。
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credential: Arc<Credential>,
}

impl RequestSigner {
    pub fn new(credential: Arc<Credential>) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// 为请求补齐签名所需的头部并写入 `Authorization`。
    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        headers: &mut HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<(), StorageError> {
        self.sign_at(method, url, headers, body, Utc::now())
    }

    /// 与 [`RequestSigner::sign`] 相同，但使用指定的时间作为 `date` 头。
    pub fn sign_at(
        &self,
        method: &Method,
        url: &Url,
        headers: &mut HeaderMap,
        body: Option<&[u8]>,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if !headers.contains_key(DATE) {
            let date = now.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
            headers.insert(DATE, HeaderValue::from_str(&date)?);
        }
        headers.insert(HOST, HeaderValue::from_str(&host_header(url))?);

        let mut signed = vec!["date", "(request-target)", "host"];

        if matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
            let body = body.unwrap_or_default();
            let digest = STANDARD.encode(Sha256::digest(body));

            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
            }
            headers.insert(X_CONTENT_SHA256, HeaderValue::from_str(&digest)?);
            signed.extend(["content-length", "content-type", X_CONTENT_SHA256]);
        }

        let signing_string = signing_string(method, url, headers, &signed);
        let signature = self.credential.sign(signing_string.as_bytes())?;

        let authorization = format!(
            r#"Signature version="1",keyId="{}",algorithm="{}",headers="{}",signature="{}""#,
            self.credential.key_id(),
            self.credential.algorithm().as_str(),
            signed.join(" "),
            signature
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);
        Ok(())
    }
}

/// 构造待签名字符串，每个签名头一行。
pub fn signing_string(method: &Method, url: &Url, headers: &HeaderMap, signed: &[&str]) -> String {
    signed
        .iter()
        .map(|name| {
            let value = match *name {
                "(request-target)" => request_target(method, url),
                name => headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string(),
            };
            format!("{}: {}", name, value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn request_target(method: &Method, url: &Url) -> String {
    let method = method.as_str().to_ascii_lowercase();
    match url.query() {
        Some(query) => format!("{} {}?{}", method, url.path(), query),
        None => format!("{} {}", method, url.path()),
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
