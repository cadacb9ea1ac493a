use crate::handlers::constants::{INVOKE_ID_HEADER, MAX_INVOKE_ID_LEN};
use http::HeaderMap;
use uuid::Uuid;

/// 从请求头部中取出调用 ID
///
/// 头部缺失，或者其值不适合拼进对象名时，生成一个新的 UUID v4。
///
/// # 参数
///
/// * `headers` - 请求头部映射
///
/// # 返回值
///
/// 本次调用使用的调用 ID
pub fn invocation_id(headers: &HeaderMap) -> String {
    headers
        .get(INVOKE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| is_valid_invocation_id(id))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn is_valid_invocation_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_INVOKE_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_invocation_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            INVOKE_ID_HEADER,
            HeaderValue::from_static("01JABCDEF0000000000000000"),
        );
        assert_eq!(invocation_id(&headers), "01JABCDEF0000000000000000");
    }

    #[test]
    fn test_invocation_id_generated_when_missing() {
        let id = invocation_id(&HeaderMap::new());
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_invocation_id_rejects_path_characters() {
        for value in ["../etc/passwd", "", "a b"] {
            let mut headers = HeaderMap::new();
            headers.insert(INVOKE_ID_HEADER, HeaderValue::from_str(value).unwrap());
            let id = invocation_id(&headers);
            assert_ne!(id, value);
            assert!(Uuid::parse_str(&id).is_ok());
        }
    }
}
