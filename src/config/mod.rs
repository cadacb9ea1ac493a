//! 函数的配置模块。
//!
//! 所有配置都来自启动时导出的环境快照，从不按键查询进程环境。
//! 该模块把快照解析成签名凭据、存储目标和运行设置三部分。

pub mod keys;

use crate::credential::materialize::{build_credential, check_ocid, classify_missing};
use crate::credential::{
    Credential, CredentialError, EnvironmentSnapshot, extract, extract_optional,
};
use keys::{
    CREDENTIAL_VALIDATE, DB_SECRET_OCID, FN_LISTENER, LOG_FORMAT, OCI_NAMESPACE,
    OCI_OBJECT_STORAGE_ENDPOINT, OCI_SECRETS_ENDPOINT, PORT, REQUIRED_KEYS, RUST_LOG,
    TARGET_BUCKET_NAME,
};
use reqwest::Url;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// 默认 TCP 端口
pub const DEFAULT_PORT: u16 = 8080;

/// 默认日志过滤指令
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// 服务监听地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    /// Fn 平台下发的 unix socket
    Unix(PathBuf),
    Tcp(SocketAddr),
}

/// 可选的运行设置，缺失时使用默认值。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub validate_credential: bool,
    pub object_storage_endpoint: Option<Url>,
    pub secrets_endpoint: Option<Url>,
    pub listen: ListenAddr,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            validate_credential: false,
            object_storage_endpoint: None,
            secrets_endpoint: None,
            listen: ListenAddr::Tcp(SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl Settings {
    /// 从快照中解析运行设置。
    ///
    /// # Errors
    ///
    /// 设置存在但无法解析时返回 `InvalidField`。
    pub fn from_snapshot(snapshot: &EnvironmentSnapshot) -> Result<Self, CredentialError> {
        let fields = extract_optional(
            snapshot,
            &[
                CREDENTIAL_VALIDATE,
                OCI_OBJECT_STORAGE_ENDPOINT,
                OCI_SECRETS_ENDPOINT,
                FN_LISTENER,
                PORT,
                RUST_LOG,
                LOG_FORMAT,
            ],
        )?;
        let mut settings = Settings::default();

        if let Some(value) = fields.get(CREDENTIAL_VALIDATE) {
            settings.validate_credential = parse_flag(CREDENTIAL_VALIDATE, value)?;
        }

        if let Some(value) = fields.get(OCI_OBJECT_STORAGE_ENDPOINT) {
            let url = Url::parse(value).map_err(|e| invalid(OCI_OBJECT_STORAGE_ENDPOINT, e))?;
            settings.object_storage_endpoint = Some(url);
        }

        if let Some(value) = fields.get(OCI_SECRETS_ENDPOINT) {
            let url = Url::parse(value).map_err(|e| invalid(OCI_SECRETS_ENDPOINT, e))?;
            settings.secrets_endpoint = Some(url);
        }

        if let Some(value) = fields.get(FN_LISTENER) {
            let path = value
                .strip_prefix("unix:")
                .filter(|path| !path.is_empty())
                .ok_or_else(|| invalid(FN_LISTENER, "expected unix:<path>"))?;
            settings.listen = ListenAddr::Unix(PathBuf::from(path));
        } else if let Some(value) = fields.get(PORT) {
            let port: u16 = value.parse().map_err(|e| invalid(PORT, e))?;
            settings.listen = ListenAddr::Tcp(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
        }

        if let Some(value) = fields.get(RUST_LOG) {
            settings.log_filter = value.to_string();
        }

        if let Some(value) = fields.get(LOG_FORMAT) {
            settings.log_format = match value.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" | "pretty" => LogFormat::Text,
                _ => return Err(invalid(LOG_FORMAT, "expected json or text")),
            };
        }

        Ok(settings)
    }
}

/// 对象存储目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    pub namespace: String,
    pub bucket: String,
}

/// 启动阶段得到的全部运行时配置。
#[derive(Debug)]
pub struct RuntimeConfig {
    pub credential: Credential,
    pub target: StorageTarget,
    /// 数据库连接信息所在的 Vault 密钥
    pub db_secret_ocid: Option<String>,
    pub settings: Settings,
}

/// 从快照加载运行时配置，包括物化签名凭据。
///
/// # Errors
///
/// 与 [`crate::credential::materialize_from`] 相同；另外存储桶或命名空间缺失时
/// 返回 `IncompleteConfiguration`，`DB_SECRET_OCID` 存在但不是 OCID 时返回 `InvalidField`。
pub fn load_runtime(snapshot: &EnvironmentSnapshot) -> Result<RuntimeConfig, CredentialError> {
    let settings = Settings::from_snapshot(snapshot)?;
    let mut fields = extract(snapshot, REQUIRED_KEYS).map_err(classify_missing)?;

    let mut optional = extract_optional(snapshot, &[DB_SECRET_OCID])?;
    let db_secret_ocid = optional.take(DB_SECRET_OCID);
    if let Some(ocid) = &db_secret_ocid {
        check_ocid(DB_SECRET_OCID, ocid)?;
    }

    let target = StorageTarget {
        namespace: fields.take(OCI_NAMESPACE).unwrap_or_default(),
        bucket: fields.take(TARGET_BUCKET_NAME).unwrap_or_default(),
    };
    let credential = build_credential(&mut fields)?;

    Ok(RuntimeConfig {
        credential,
        target,
        db_secret_ocid,
        settings,
    })
}

fn parse_flag(field: &str, value: &str) -> Result<bool, CredentialError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, "expected a boolean")),
    }
}

fn invalid(field: &str, reason: impl ToString) -> CredentialError {
    CredentialError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
