//! OCI 函数库
//!
//! 这是一个运行在 Fn / OCI Functions 上的函数，主要功能包括：
//! - 冷启动时从被平台破坏的环境中恢复签名凭据
//! - 用签名凭据调用对象存储，并从 Vault 读取数据库连接信息
//! - 通过 `POST /call` 处理每次调用

pub mod config;
pub mod credential;
pub mod database;
pub mod handlers;
pub mod listener;
pub mod logging;
pub mod storage;
pub mod utils;
pub mod vault;

#[cfg(test)]
mod test_support;

use axum::Router;
use axum::routing::post;
use config::{RuntimeConfig, Settings, StorageTarget, load_runtime};
use credential::EnvironmentSnapshot;
use database::{CONNECT_TIMEOUT, Database, PgDatabase};
use std::sync::Arc;
use storage::client::VALIDATION_TIMEOUT;
use storage::{ObjectStorageClient, ObjectStore};
use tower_http::trace::TraceLayer;
use vault::SecretsClient;

/// 处理器共享的状态，启动后只读。
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ObjectStore>,
    target: Arc<StorageTarget>,
    database: Option<Arc<dyn Database>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, target: StorageTarget) -> Self {
        Self {
            store,
            target: Arc::new(target),
            database: None,
        }
    }

    /// 附加数据库，之后每次调用都会查询数据库版本。
    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn database(&self) -> Option<&dyn Database> {
        self.database.as_deref()
    }

    /// 关闭持有的资源。
    pub async fn close(&self) {
        if let Some(database) = &self.database {
            database.close().await;
        }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn target(&self) -> &StorageTarget {
        &self.target
    }
}

/// 创建并配置Axum应用程序
///
/// # Returns
///
/// 返回配置好的Axum Router实例
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/call", post(handlers::handle_call))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 冷启动：从快照物化凭据，创建对象存储客户端，按需远程校验凭据。
/// 配置了 `DB_SECRET_OCID` 时再从 Vault 读取数据库连接信息并建立连接池。
///
/// # Errors
///
/// 失败原因可以用 `downcast_ref` 取回：凭据相关的是 [`credential::CredentialError`]，
/// 读取密钥失败是 [`vault::VaultError`]，数据库不可用是 [`sqlx::Error`]。
pub async fn bootstrap(snapshot: &EnvironmentSnapshot) -> anyhow::Result<(AppState, Settings)> {
    let RuntimeConfig {
        credential,
        target,
        db_secret_ocid,
        settings,
    } = load_runtime(snapshot)?;
    let credential = Arc::new(credential);

    let client = ObjectStorageClient::new(
        credential.clone(),
        settings.object_storage_endpoint.clone(),
    )?;

    if settings.validate_credential {
        let namespace = client.validate_credential(VALIDATION_TIMEOUT).await?;
        if namespace != target.namespace {
            tracing::warn!(
                configured = %target.namespace,
                actual = %namespace,
                "配置的命名空间与租户命名空间不一致"
            );
        }
        tracing::info!("凭据远程校验通过");
    }

    let mut state = AppState::new(Arc::new(client), target);

    match db_secret_ocid {
        Some(secret_id) => {
            let secrets = SecretsClient::new(credential, settings.secrets_endpoint.clone())?;
            let db_credentials = secrets.db_credentials(&secret_id).await?;
            tracing::info!(
                dbname = %db_credentials.dbname,
                host = %db_credentials.host,
                "正在初始化数据库连接池"
            );
            let database = PgDatabase::connect(&db_credentials, CONNECT_TIMEOUT).await?;
            state = state.with_database(Arc::new(database));
        }
        None => tracing::info!("未配置 DB_SECRET_OCID，跳过数据库初始化"),
    }

    Ok((state, settings))
}
