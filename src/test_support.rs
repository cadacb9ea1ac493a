//! 单元测试共用的样例数据。

use crate::credential::{Credential, EnvironmentSnapshot, materialize_from};
use std::sync::Arc;

pub const PKCS1_PEM: &str = include_str!("../tests/fixtures/rsa_pkcs1.pem");

/// 样例私钥的 API 指纹
pub const FINGERPRINT: &str = "3d:43:4f:a0:eb:5c:e6:b2:4c:3c:05:53:d3:69:d9:a8";

/// 平台注入的样例环境快照，私钥已被压成一行。
pub fn sample_snapshot() -> EnvironmentSnapshot {
    let flat: String = PKCS1_PEM.lines().collect();
    EnvironmentSnapshot::from_text(format!(
        "OCI_USER_OCID=ocid1.user.oc1..aaaauser\0\
         OCI_TENANCY_OCID=ocid1.tenancy.oc1..aaaatenancy\0\
         OCI_REGION=us-ashburn-1\0\
         OCI_FINGERPRINT={FINGERPRINT}\0\
         OCI_PRIVATE_KEY_CONTENT={flat}\0\
         TARGET_BUCKET_NAME=hello-bucket\0\
         OCI_NAMESPACE=axaxnpcrorw5\0"
    ))
}

pub fn sample_credential() -> Arc<Credential> {
    Arc::new(materialize_from(&sample_snapshot()).expect("sample credential materializes"))
}
