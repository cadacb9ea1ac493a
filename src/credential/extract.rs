//! 字段解析模块
//!
//! 从环境快照文本中按键名提取字段。支持两种固定的文本格式：
//!
//! - NUL 分隔：`KEY=value\0KEY=value\0`，与 `/proc/<pid>/environ` 相同，值按原样保留；
//! - 文本格式：`KEY=value`、`KEY='value'`、`KEY: value` 以及 `'KEY': 'value'`
//!   这样的映射表示，条目之间以换行或逗号分隔。
//!
//! 键必须出现在条目开头，所以 `XOCI_REGION=` 不会被当成 `OCI_REGION`。

use super::error::CredentialError;
use super::snapshot::EnvironmentSnapshot;
use regex::Regex;
use secrecy::SecretString;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use zeroize::Zeroize;

/// 条目开头的键标记：`KEY=`、`KEY: `、`'KEY': `、`"KEY"=` 等。
static ENTRY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:'([^'\n]+)'|"([^"\n]+)"|([A-Za-z_][A-Za-z0-9_.]*))[ \t]*(?:=|:[ \t]+)"#,
    )
    .expect("entry marker pattern is valid")
});

/// 重复出现的字段（非致命诊断）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateField {
    pub key: String,
    pub occurrences: usize,
}

/// 解析出的字段集合。
///
/// `Debug` 只输出字段名；值在析构时清零。
#[derive(Default)]
pub struct ExtractedFields {
    values: BTreeMap<String, String>,
    duplicates: Vec<DuplicateField>,
}

impl ExtractedFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 取出一个字段的值。
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// 以机密形式取出一个字段的值，用于私钥内容。
    pub fn take_secret(&mut self, key: &str) -> Option<SecretString> {
        self.values.remove(key).map(SecretString::new)
    }

    /// 解析过程中发现的重复字段。
    pub fn duplicates(&self) -> &[DuplicateField] {
        &self.duplicates
    }
}

impl fmt::Debug for ExtractedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractedFields")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("duplicates", &self.duplicates)
            .finish()
    }
}

impl Drop for ExtractedFields {
    fn drop(&mut self) {
        for value in self.values.values_mut() {
            value.zeroize();
        }
    }
}

/// 提取必需字段。
///
/// 与快照中条目的物理顺序无关。同一个键出现多次时采用第一次出现的值，
/// 并记录一条重复字段诊断。
///
/// # Errors
///
/// * `MalformedSnapshot` - 快照中找不到任何 `KEY=value` 条目，或某个必需字段的引号未闭合。
/// * `MissingField` - 列出所有缺失或为空的必需字段。
pub fn extract(
    snapshot: &EnvironmentSnapshot,
    required: &[&str],
) -> Result<ExtractedFields, CredentialError> {
    let entries = parse_entries(snapshot.expose())?;
    let (fields, missing) = collect(&entries, required)?;

    if !missing.is_empty() {
        return Err(CredentialError::MissingField { fields: missing });
    }
    Ok(fields)
}

/// 提取可选字段，缺失的键直接忽略。
pub fn extract_optional(
    snapshot: &EnvironmentSnapshot,
    keys: &[&str],
) -> Result<ExtractedFields, CredentialError> {
    let entries = parse_entries(snapshot.expose())?;
    Ok(collect(&entries, keys)?.0)
}

struct Entry<'a> {
    key: &'a str,
    value: Cow<'a, str>,
    /// 值以引号开头但没有闭合
    unterminated: bool,
}

fn collect(
    entries: &[Entry<'_>],
    keys: &[&str],
) -> Result<(ExtractedFields, Vec<String>), CredentialError> {
    let mut fields = ExtractedFields::default();
    let mut missing = Vec::new();

    for &key in keys {
        if fields.values.contains_key(key) || missing.iter().any(|m| m == key) {
            continue;
        }

        let mut matches = entries.iter().filter(|entry| entry.key == key);
        let Some(first) = matches.next() else {
            missing.push(key.to_string());
            continue;
        };

        if first.unterminated {
            return Err(CredentialError::MalformedSnapshot {
                reason: format!("unterminated quoted value for {key}"),
            });
        }

        let extra = matches.count();
        if extra > 0 {
            tracing::warn!(
                field = key,
                occurrences = extra + 1,
                "字段在环境快照中重复出现，使用第一次出现的值"
            );
            fields.duplicates.push(DuplicateField {
                key: key.to_string(),
                occurrences: extra + 1,
            });
        }

        let value = first.value.trim();
        if value.is_empty() {
            missing.push(key.to_string());
        } else {
            fields.values.insert(key.to_string(), value.to_string());
        }
    }

    Ok((fields, missing))
}

fn parse_entries(text: &str) -> Result<Vec<Entry<'_>>, CredentialError> {
    let entries = if text.contains('\0') {
        parse_nul_delimited(text)
    } else {
        parse_text(text)
    };

    if entries.is_empty() {
        return Err(CredentialError::MalformedSnapshot {
            reason: "no KEY=value entries found".to_string(),
        });
    }
    Ok(entries)
}

fn parse_nul_delimited(text: &str) -> Vec<Entry<'_>> {
    text.split('\0')
        .filter_map(|raw| {
            let (key, value) = raw.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| Entry {
                key,
                value: Cow::Borrowed(value),
                unterminated: false,
            })
        })
        .collect()
}

fn parse_text(text: &str) -> Vec<Entry<'_>> {
    let bytes = text.as_bytes();
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        if matches!(
            bytes[pos],
            b'\n' | b'\r' | b',' | b'{' | b'}' | b'(' | b')' | b' ' | b'\t'
        ) {
            pos += 1;
            continue;
        }

        let rest = &text[pos..];
        let Some(caps) = ENTRY_MARKER.captures(rest) else {
            // 不认识的内容（例如 `environ(` 前缀），跳到下一个分隔符
            pos += rest
                .find(['\n', ',', '{', '('])
                .unwrap_or(rest.len())
                .max(1);
            continue;
        };

        let Some(key) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
            pos += caps.get(0).map_or(1, |m| m.end());
            continue;
        };
        let key = key.as_str();
        pos += caps.get(0).map_or(0, |m| m.end());

        while pos < text.len() && matches!(bytes[pos], b' ' | b'\t') {
            pos += 1;
        }

        let rest = &text[pos..];
        let (value, consumed, unterminated) = match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => match read_quoted(rest, quote) {
                Some((value, consumed)) => (value, consumed, false),
                // 只有被请求的字段才会因此报错，其余条目从下一行继续解析
                None => {
                    let line = rest.find('\n').unwrap_or(rest.len());
                    (Cow::Borrowed(&rest[..line]), line, true)
                }
            },
            _ => {
                let (value, consumed) = read_unquoted(rest);
                (value, consumed, false)
            }
        };
        pos += consumed;

        entries.push(Entry {
            key,
            value,
            unterminated,
        });
    }

    entries
}

/// 读取以 `quote` 开头的带引号值，返回反转义后的值和消耗的字节数。
fn read_quoted(s: &str, quote: char) -> Option<(Cow<'_, str>, usize)> {
    let body_start = quote.len_utf8();
    let mut owned: Option<String> = None;
    let mut chars = s[body_start..].char_indices();

    while let Some((i, c)) = chars.next() {
        if c == quote {
            let end = body_start + i;
            let value = match owned {
                Some(value) => Cow::Owned(value),
                None => Cow::Borrowed(&s[body_start..end]),
            };
            return Some((value, end + quote.len_utf8()));
        }

        if c == '\\' {
            let buf = owned.get_or_insert_with(|| s[body_start..body_start + i].to_string());
            let (_, escaped) = chars.next()?;
            match escaped {
                'n' => buf.push('\n'),
                'r' => buf.push('\r'),
                't' => buf.push('\t'),
                '\\' | '\'' | '"' => buf.push(escaped),
                other => {
                    buf.push('\\');
                    buf.push(other);
                }
            }
        } else if let Some(buf) = owned.as_mut() {
            buf.push(c);
        }
    }

    None
}

/// 读取不带引号的值：到换行为止，或到开始下一个条目的逗号为止。
fn read_unquoted(s: &str) -> (Cow<'_, str>, usize) {
    for (i, c) in s.char_indices() {
        match c {
            '\n' | '\r' => return (Cow::Borrowed(&s[..i]), i),
            ',' if ENTRY_MARKER.is_match(s[i + 1..].trim_start()) => {
                return (Cow::Borrowed(&s[..i]), i);
            }
            _ => {}
        }
    }
    (Cow::Borrowed(s), s.len())
}
