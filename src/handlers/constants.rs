/// Fn 平台为每次调用下发的调用 ID 头部
pub const INVOKE_ID_HEADER: &str = "fn-invoke-id";

/// 写入存储桶的对象名前缀
pub const OBJECT_NAME_PREFIX: &str = "hello-from-function-";

/// 写入存储桶的对象扩展名
pub const OBJECT_NAME_SUFFIX: &str = ".txt";

/// 对象写入成功、未配置数据库时的响应消息
pub const WRITE_SUCCESS_MESSAGE: &str = "File written to bucket successfully.";

/// 对象写入成功且数据库查询成功时的响应消息
pub const DB_VERIFIED_MESSAGE: &str = "File written to bucket and database connection verified.";

/// 调用 ID 允许的最大长度，超出时改用新生成的 ID
pub const MAX_INVOKE_ID_LEN: usize = 128;

/// 根据调用 ID 生成对象名。
pub fn object_name(invocation_id: &str) -> String {
    format!("{}{}{}", OBJECT_NAME_PREFIX, invocation_id, OBJECT_NAME_SUFFIX)
}

/// 根据调用 ID 生成对象内容。
pub fn object_body(invocation_id: &str) -> String {
    format!(
        "Hello from OCI Function! This is invocation {}.",
        invocation_id
    )
}
