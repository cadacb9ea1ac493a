//! 数据库模块
//!
//! 用 Vault 中取回的连接信息建立 Postgres 连接池，启动时执行一次 `SELECT 1`
//! 确认连通，每次调用时查询数据库版本。

use crate::vault::DbCredentials;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;

/// 启动时建立连接的超时时间
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 连接池大小
const MIN_CONNECTIONS: u32 = 1;
const MAX_CONNECTIONS: u32 = 5;

/// 处理器使用的数据库接口。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Database: Send + Sync {
    /// 查询数据库版本字符串。
    async fn version(&self) -> Result<String, sqlx::Error>;

    /// 关闭连接池，等待借出的连接归还。
    async fn close(&self);
}

/// Postgres 连接池
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// 建立连接池并执行一次 `SELECT 1`。
    ///
    /// # Errors
    ///
    /// 在 `timeout` 内无法建立连接，或检查查询失败时返回错误。
    pub async fn connect(
        credentials: &DbCredentials,
        timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let options = PgConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .database(&credentials.dbname)
            .username(&credentials.username)
            .password(credentials.password());

        let pool = PgPoolOptions::new()
            .min_connections(MIN_CONNECTIONS)
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::info!(
            dbname = %credentials.dbname,
            host = %credentials.host,
            "数据库连接池初始化完成"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn version(&self) -> Result<String, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("数据库连接池已关闭");
    }
}
