//! 环境变量键名。
//!
//! 这些键名是与平台之间的固定约定。

/// API 用户的 OCID
pub const OCI_USER_OCID: &str = "OCI_USER_OCID";

/// 租户的 OCID
pub const OCI_TENANCY_OCID: &str = "OCI_TENANCY_OCID";

/// 区域标识，例如 `us-ashburn-1`
pub const OCI_REGION: &str = "OCI_REGION";

/// API 签名密钥的指纹
pub const OCI_FINGERPRINT: &str = "OCI_FINGERPRINT";

/// 私钥内容（平台会去掉其中的换行符）
pub const OCI_PRIVATE_KEY_CONTENT: &str = "OCI_PRIVATE_KEY_CONTENT";

/// 目标存储桶名称
pub const TARGET_BUCKET_NAME: &str = "TARGET_BUCKET_NAME";

/// 对象存储命名空间
pub const OCI_NAMESPACE: &str = "OCI_NAMESPACE";

/// 保存数据库连接信息的 Vault 密钥 OCID，未设置时不连接数据库
pub const DB_SECRET_OCID: &str = "DB_SECRET_OCID";

/// 启动时是否向对象存储发起一次凭据校验
pub const CREDENTIAL_VALIDATE: &str = "CREDENTIAL_VALIDATE";

/// 覆盖对象存储端点（本地调试和测试用）
pub const OCI_OBJECT_STORAGE_ENDPOINT: &str = "OCI_OBJECT_STORAGE_ENDPOINT";

/// 覆盖 Vault 密钥服务端点（本地调试和测试用）
pub const OCI_SECRETS_ENDPOINT: &str = "OCI_SECRETS_ENDPOINT";

/// Fn 平台下发的监听地址，例如 `unix:/tmp/iofs/lsnr.sock`
pub const FN_LISTENER: &str = "FN_LISTENER";

/// 未设置 `FN_LISTENER` 时使用的 TCP 端口
pub const PORT: &str = "PORT";

/// 日志过滤指令
pub const RUST_LOG: &str = "RUST_LOG";

/// 日志输出格式：`json` 或 `text`
pub const LOG_FORMAT: &str = "LOG_FORMAT";

/// 构造签名凭据所需的字段。
pub const CREDENTIAL_KEYS: &[&str] = &[
    OCI_USER_OCID,
    OCI_TENANCY_OCID,
    OCI_REGION,
    OCI_FINGERPRINT,
    OCI_PRIVATE_KEY_CONTENT,
];

/// 启动时必须存在的全部字段。
pub const REQUIRED_KEYS: &[&str] = &[
    OCI_USER_OCID,
    OCI_TENANCY_OCID,
    OCI_REGION,
    OCI_FINGERPRINT,
    OCI_PRIVATE_KEY_CONTENT,
    TARGET_BUCKET_NAME,
    OCI_NAMESPACE,
];
