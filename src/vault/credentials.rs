//! 数据库连接信息
//!
//! Vault 密钥内容是一个 JSON 对象：
//! `{"host": ..., "port": ..., "dbname": ..., "username": ..., "password": ...}`。

use super::error::VaultError;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::fmt;

/// 从 Vault 取回的数据库连接信息，`Debug` 不输出密码。
pub struct DbCredentials {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub username: String,
    password: SecretString,
}

impl DbCredentials {
    /// 解析密钥内容。
    ///
    /// `port` 可以是数字，也可以是数字字符串。
    ///
    /// # Errors
    ///
    /// 内容不是 JSON 对象，或缺少任一字段时返回 `Credentials`，原因中只有字段名。
    pub fn from_json(content: &SecretString) -> Result<Self, VaultError> {
        let value: Value =
            serde_json::from_str(content.expose_secret()).map_err(|_| VaultError::Credentials {
                reason: "secret content is not a JSON document".to_string(),
            })?;
        let Value::Object(object) = value else {
            return Err(VaultError::Credentials {
                reason: "secret content is not a JSON object".to_string(),
            });
        };

        Ok(Self {
            host: string_field(&object, "host")?,
            port: port_field(&object)?,
            dbname: string_field(&object, "dbname")?,
            username: string_field(&object, "username")?,
            password: SecretString::new(string_field(&object, "password")?),
        })
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn string_field(object: &Map<String, Value>, name: &str) -> Result<String, VaultError> {
    object
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| VaultError::Credentials {
            reason: format!("missing or invalid field `{}`", name),
        })
}

fn port_field(object: &Map<String, Value>) -> Result<u16, VaultError> {
    let port = match object.get("port") {
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    };
    port.ok_or_else(|| VaultError::Credentials {
        reason: "missing or invalid field `port`".to_string(),
    })
}
