//! 签名凭据
//!
//! 校验通过后的身份和签名私钥，构造后不可变，整个进程生命周期内只读共享。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha256;
use std::fmt;

/// 签名算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    RsaSha256,
}

impl SigningAlgorithm {
    /// 签名头中使用的算法名。
    pub fn as_str(self) -> &'static str {
        match self {
            SigningAlgorithm::RsaSha256 => "rsa-sha256",
        }
    }
}

/// 已校验的签名凭据。
pub struct Credential {
    user_ocid: String,
    tenancy_ocid: String,
    region: String,
    fingerprint: String,
    signing_key: SigningKey<Sha256>,
    algorithm: SigningAlgorithm,
}

impl Credential {
    pub(crate) fn new(
        user_ocid: String,
        tenancy_ocid: String,
        region: String,
        fingerprint: String,
        private_key: RsaPrivateKey,
    ) -> Self {
        Self {
            user_ocid,
            tenancy_ocid,
            region,
            fingerprint,
            signing_key: SigningKey::<Sha256>::new(private_key),
            algorithm: SigningAlgorithm::RsaSha256,
        }
    }

    pub fn user_ocid(&self) -> &str {
        &self.user_ocid
    }

    pub fn tenancy_ocid(&self) -> &str {
        &self.tenancy_ocid
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// 签名头中的 `keyId`：`{tenancy}/{user}/{fingerprint}`
    pub fn key_id(&self) -> String {
        format!(
            "{}/{}/{}",
            self.tenancy_ocid, self.user_ocid, self.fingerprint
        )
    }

    /// 对数据签名，返回 base64 编码的签名。
    pub fn sign(&self, data: &[u8]) -> Result<String, rsa::signature::Error> {
        let signature = self.signing_key.try_sign(data)?;
        Ok(STANDARD.encode(signature.to_bytes()))
    }

    #[cfg(test)]
    pub(crate) fn verifying_key(&self) -> rsa::pkcs1v15::VerifyingKey<Sha256> {
        use rsa::signature::Keypair;
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_ocid", &self.user_ocid)
            .field("tenancy_ocid", &self.tenancy_ocid)
            .field("region", &self.region)
            .field("fingerprint", &self.fingerprint)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// 计算私钥的 API 密钥指纹。
///
/// 指纹是 DER 编码的 SubjectPublicKeyInfo 的 MD5，以冒号分隔的小写十六进制表示。
pub fn key_fingerprint(private_key: &RsaPrivateKey) -> Result<String, rsa::pkcs8::spki::Error> {
    let der = private_key.to_public_key().to_public_key_der()?;
    let digest = Md5::digest(der.as_bytes());
    Ok(digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":"))
}
