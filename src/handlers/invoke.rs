//! 函数调用处理器
//!
//! 每次调用向目标存储桶写入一个小文本对象；配置了数据库时再查询一次数据库版本，
//! 并以 JSON 报告结果。

use super::constants::{
    DB_VERIFIED_MESSAGE, WRITE_SUCCESS_MESSAGE, object_body, object_name,
};
use crate::AppState;
use crate::utils::headers::invocation_id;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

/// `/call` 的响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CallResponse {
    Success {
        message: String,
        invocation_id: String,
        bucket: String,
        object_name: String,
        /// 未配置数据库时不输出
        #[serde(default, skip_serializing_if = "Option::is_none")]
        database_version: Option<String>,
    },
    Error {
        message: String,
    },
}

impl CallResponse {
    fn error(message: String) -> (StatusCode, Json<CallResponse>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CallResponse::Error { message }),
        )
    }
}

/// 处理一次函数调用。
///
/// 调用 ID 取自 `fn-invoke-id` 头部，缺失时生成一个 UUID v4。
///
/// # 返回值
///
/// 全部成功返回 200，存储或数据库失败返回 500，响应体均为 [`CallResponse`]。
pub async fn handle_call(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<CallResponse>) {
    let invocation_id = invocation_id(&headers);
    let span = tracing::info_span!("invocation", invocation_id = %invocation_id);

    async move {
        tracing::info!("收到调用");
        let target = state.target();
        let object_name = object_name(&invocation_id);
        let body = object_body(&invocation_id).into_bytes();

        if let Err(e) = state
            .store()
            .put_object(&target.namespace, &target.bucket, &object_name, body)
            .await
        {
            tracing::error!(error = %e, bucket = %target.bucket, "对象写入失败");
            return CallResponse::error(format!("OCI Error: {}", e));
        }
        tracing::info!(bucket = %target.bucket, object = %object_name, "对象写入成功");

        let (message, database_version) = match state.database() {
            Some(database) => match database.version().await {
                Ok(version) => {
                    let short: String = version.chars().take(30).collect();
                    tracing::info!(version = %short, "数据库连接正常");
                    (DB_VERIFIED_MESSAGE, Some(version))
                }
                Err(e) => {
                    tracing::error!(error = %e, "数据库查询失败");
                    return CallResponse::error(format!("Database Error: {}", e));
                }
            },
            None => (WRITE_SUCCESS_MESSAGE, None),
        };

        let response = CallResponse::Success {
            message: message.to_string(),
            invocation_id: invocation_id.clone(),
            bucket: target.bucket.clone(),
            object_name,
            database_version,
        };
        (StatusCode::OK, Json(response))
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageTarget;
    use crate::database::MockDatabase;
    use crate::storage::{MockObjectStore, StorageError};
    use axum::http::HeaderValue;
    use mockall::predicate::eq;
    use std::sync::Arc;

    fn state_with(store: MockObjectStore) -> AppState {
        AppState::new(
            Arc::new(store),
            StorageTarget {
                namespace: "axaxnpcrorw5".to_string(),
                bucket: "hello-bucket".to_string(),
            },
        )
    }

    fn accepting_store() -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        store
    }

    #[tokio::test]
    async fn test_handle_call_writes_object() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .with(
                eq("axaxnpcrorw5"),
                eq("hello-bucket"),
                eq("hello-from-function-abc-123.txt"),
                eq(b"Hello from OCI Function! This is invocation abc-123.".to_vec()),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut headers = HeaderMap::new();
        headers.insert("fn-invoke-id", HeaderValue::from_static("abc-123"));

        let (status, Json(body)) = handle_call(State(state_with(store)), headers).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            CallResponse::Success {
                message: "File written to bucket successfully.".to_string(),
                invocation_id: "abc-123".to_string(),
                bucket: "hello-bucket".to_string(),
                object_name: "hello-from-function-abc-123.txt".to_string(),
                database_version: None,
            }
        );
    }

    #[tokio::test]
    async fn test_handle_call_generates_invocation_id() {
        let (status, Json(body)) =
            handle_call(State(state_with(accepting_store())), HeaderMap::new()).await;

        assert_eq!(status, StatusCode::OK);
        match body {
            CallResponse::Success {
                invocation_id,
                object_name,
                ..
            } => {
                assert!(uuid::Uuid::parse_str(&invocation_id).is_ok());
                assert_eq!(object_name, format!("hello-from-function-{}.txt", invocation_id));
            }
            other => panic!("期望成功响应，实际为 {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_call_storage_failure() {
        let mut store = MockObjectStore::new();
        store.expect_put_object().times(1).returning(|_, _, _, _| {
            Err(StorageError::InvalidEndpoint("objectstorage".to_string()))
        });
        let mut database = MockDatabase::new();
        database.expect_version().never();

        let state = state_with(store).with_database(Arc::new(database));
        let (status, Json(body)) = handle_call(State(state), HeaderMap::new()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        match body {
            CallResponse::Error { message } => assert!(message.starts_with("OCI Error:")),
            other => panic!("期望错误响应，实际为 {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_call_reports_database_version() {
        let mut database = MockDatabase::new();
        database
            .expect_version()
            .times(1)
            .returning(|| Ok("PostgreSQL 16.4 on x86_64-pc-linux-gnu".to_string()));

        let state = state_with(accepting_store()).with_database(Arc::new(database));
        let (status, Json(body)) = handle_call(State(state), HeaderMap::new()).await;

        assert_eq!(status, StatusCode::OK);
        match body {
            CallResponse::Success {
                message,
                database_version,
                ..
            } => {
                assert_eq!(
                    message,
                    "File written to bucket and database connection verified."
                );
                assert_eq!(
                    database_version.as_deref(),
                    Some("PostgreSQL 16.4 on x86_64-pc-linux-gnu")
                );
            }
            other => panic!("期望成功响应，实际为 {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_call_database_failure() {
        let mut database = MockDatabase::new();
        database
            .expect_version()
            .times(1)
            .returning(|| Err(sqlx::Error::PoolTimedOut));

        let state = state_with(accepting_store()).with_database(Arc::new(database));
        let (status, Json(body)) = handle_call(State(state), HeaderMap::new()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        match body {
            CallResponse::Error { message } => assert!(message.starts_with("Database Error:")),
            other => panic!("期望错误响应，实际为 {:?}", other),
        }
    }

    #[test]
    fn test_response_json_shape() {
        let value = serde_json::to_value(CallResponse::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"status": "error", "message": "boom"}));

        let value = serde_json::to_value(CallResponse::Success {
            message: "ok".to_string(),
            invocation_id: "1".to_string(),
            bucket: "b".to_string(),
            object_name: "o".to_string(),
            database_version: None,
        })
        .unwrap();
        assert!(value.get("database_version").is_none());
    }
}
