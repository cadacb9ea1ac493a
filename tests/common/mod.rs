//! 集成测试共用的样例数据。

#![allow(dead_code)]

use oci_function::credential::EnvironmentSnapshot;

pub const PKCS1_PEM: &str = include_str!("../fixtures/rsa_pkcs1.pem");
pub const PKCS8_PEM: &str = include_str!("../fixtures/rsa_pkcs8.pem");

/// 样例私钥的 API 指纹
pub const FINGERPRINT: &str = "3d:43:4f:a0:eb:5c:e6:b2:4c:3c:05:53:d3:69:d9:a8";

pub const USER_OCID: &str = "ocid1.user.oc1..aaaaaaaauser";
pub const TENANCY_OCID: &str = "ocid1.tenancy.oc1..aaaaaaaatenancy";
pub const BUCKET: &str = "hello-bucket";
pub const NAMESPACE: &str = "axaxnpcrorw5";

/// 平台压平后的私钥：去掉所有换行
pub fn flatten(pem: &str) -> String {
    pem.lines().collect()
}

/// 全部必需字段，私钥已压平
pub fn required_pairs(key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("OCI_USER_OCID", USER_OCID.to_string()),
        ("OCI_TENANCY_OCID", TENANCY_OCID.to_string()),
        ("OCI_REGION", "us-ashburn-1".to_string()),
        ("OCI_FINGERPRINT", FINGERPRINT.to_string()),
        ("OCI_PRIVATE_KEY_CONTENT", flatten(key)),
        ("TARGET_BUCKET_NAME", BUCKET.to_string()),
        ("OCI_NAMESPACE", NAMESPACE.to_string()),
    ]
}

/// 以 NUL 分隔的环境表
pub fn nul_snapshot(pairs: &[(&str, String)]) -> EnvironmentSnapshot {
    let mut text = String::from("HOME=/home/fn\0PATH=/usr/local/bin:/usr/bin\0");
    for (key, value) in pairs {
        text.push_str(&format!("{}={}\0", key, value));
    }
    EnvironmentSnapshot::from_text(text)
}

/// 平台接口输出的 `environ({...})` 形式
pub fn repr_snapshot(pairs: &[(&str, String)]) -> EnvironmentSnapshot {
    let body = pairs
        .iter()
        .map(|(key, value)| format!("'{}': '{}'", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    EnvironmentSnapshot::from_text(format!(
        "environ({{'HOME': '/home/fn', {}, 'PATH': '/usr/bin'}})",
        body
    ))
}
