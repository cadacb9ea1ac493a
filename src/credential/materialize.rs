//! 凭据物化
//!
//! 串联快照导出、字段解析、私钥修复和解码校验，得到最终的 `Credential`。
//! 每个进程只执行一次，失败即终止启动。

use super::error::CredentialError;
use super::extract::{ExtractedFields, extract};
use super::identity::{Credential, key_fingerprint};
use super::repair::{KeyEncoding, repair};
use super::snapshot::EnvironmentSnapshot;
use crate::config::keys::{
    CREDENTIAL_KEYS, OCI_FINGERPRINT, OCI_PRIVATE_KEY_CONTENT, OCI_REGION, OCI_TENANCY_OCID,
    OCI_USER_OCID,
};
use regex::Regex;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use secrecy::ExposeSecret;
use std::sync::LazyLock;

/// OCID 形如 `ocid1.<资源类型>.<realm>.[区域].<唯一标识>`
static OCID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ocid1\.[a-z0-9_-]+\.[a-z0-9_-]+\.[a-z0-9_-]*\.[A-Za-z0-9_.-]+$")
        .expect("ocid pattern is valid")
});

/// 16 字节十六进制，冒号分隔
static FINGERPRINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-f]{2}:){15}[0-9a-f]{2}$").expect("fingerprint pattern is valid")
});

/// 导出当前进程的环境快照并物化签名凭据。
pub fn materialize() -> Result<Credential, CredentialError> {
    let snapshot = EnvironmentSnapshot::capture()?;
    materialize_from(&snapshot)
}

/// 从给定快照物化签名凭据。
///
/// # Errors
///
/// * `IncompleteConfiguration` - 私钥以外的必需字段缺失。
/// * `MissingField` - 只有私钥内容缺失。
/// * `KeyFormatUnrecognized` / `KeyBodyInvalid` / `MalformedSnapshot` - 私钥修复失败。
/// * `InvalidPrivateKey` - 解码器拒绝重建后的私钥。
/// * `FingerprintMismatch` - 配置的指纹与私钥不一致。
pub fn materialize_from(snapshot: &EnvironmentSnapshot) -> Result<Credential, CredentialError> {
    let mut fields = extract(snapshot, CREDENTIAL_KEYS).map_err(classify_missing)?;
    build_credential(&mut fields)
}

/// 把缺失字段错误按是否涉及私钥以外的字段重新归类。
///
/// `IncompleteConfiguration` 只列出私钥以外的缺失字段。
pub(crate) fn classify_missing(err: CredentialError) -> CredentialError {
    match err {
        CredentialError::MissingField { fields }
            if fields.iter().any(|f| f != OCI_PRIVATE_KEY_CONTENT) =>
        {
            CredentialError::IncompleteConfiguration {
                fields: fields
                    .into_iter()
                    .filter(|f| f != OCI_PRIVATE_KEY_CONTENT)
                    .collect(),
            }
        }
        other => other,
    }
}

/// 用已解析的字段构造凭据，会从 `fields` 中取走私钥内容。
pub(crate) fn build_credential(fields: &mut ExtractedFields) -> Result<Credential, CredentialError> {
    let user_ocid = require(fields, OCI_USER_OCID)?;
    let tenancy_ocid = require(fields, OCI_TENANCY_OCID)?;
    let region = require(fields, OCI_REGION)?;
    let fingerprint = require(fields, OCI_FINGERPRINT)?.to_ascii_lowercase();

    check_ocid(OCI_USER_OCID, &user_ocid)?;
    check_ocid(OCI_TENANCY_OCID, &tenancy_ocid)?;
    if !FINGERPRINT_PATTERN.is_match(&fingerprint) {
        return Err(CredentialError::InvalidField {
            field: OCI_FINGERPRINT.to_string(),
            reason: "expected 16 colon-separated hex bytes".to_string(),
        });
    }

    let raw_key = fields
        .take_secret(OCI_PRIVATE_KEY_CONTENT)
        .ok_or_else(|| CredentialError::MissingField {
            fields: vec![OCI_PRIVATE_KEY_CONTENT.to_string()],
        })?;

    tracing::info!("正在重建被平台压平的 PEM 私钥");
    let reconstructed = repair(raw_key.expose_secret())?;
    drop(raw_key);

    let private_key = decode_private_key(reconstructed.encoding(), reconstructed.pem())?;
    let derived = key_fingerprint(&private_key).map_err(|e| CredentialError::InvalidPrivateKey {
        reason: format!("cannot encode public key: {e}"),
    })?;
    if derived != fingerprint {
        return Err(CredentialError::FingerprintMismatch);
    }

    tracing::info!(
        encoding = reconstructed.encoding().as_str(),
        region = %region,
        "签名凭据校验通过"
    );
    Ok(Credential::new(
        user_ocid,
        tenancy_ocid,
        region,
        fingerprint,
        private_key,
    ))
}

fn require(fields: &mut ExtractedFields, key: &str) -> Result<String, CredentialError> {
    fields
        .take(key)
        .ok_or_else(|| CredentialError::IncompleteConfiguration {
            fields: vec![key.to_string()],
        })
}

/// 检查字段值是否为 OCID。
pub(crate) fn check_ocid(field: &str, value: &str) -> Result<(), CredentialError> {
    if OCID_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(CredentialError::InvalidField {
            field: field.to_string(),
            reason: "not an ocid1 identifier".to_string(),
        })
    }
}

fn decode_private_key(encoding: KeyEncoding, pem: &str) -> Result<RsaPrivateKey, CredentialError> {
    let key = match encoding {
        KeyEncoding::Pkcs1 => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string()),
        KeyEncoding::Pkcs8 => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string()),
    }
    .map_err(|reason| CredentialError::InvalidPrivateKey {
        reason: format!("{} decode failed: {reason}", encoding.as_str()),
    })?;

    key.validate()
        .map_err(|e| CredentialError::InvalidPrivateKey {
            reason: e.to_string(),
        })?;
    Ok(key)
}
