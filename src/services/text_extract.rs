//! 处理后文本提取
//!
//! 服务商历史上用过好几种负载格式推送处理后的文本，
//! 这里用一张有序的提取器表依次尝试，第一个命中的结果生效。

use serde_json::Value as JsonValue;

type Extractor = fn(&JsonValue) -> Option<String>;

/// 提取器表，顺序即优先级
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("string", |v: &JsonValue| v.as_str().map(str::to_string)),
    ("text", |v: &JsonValue| string_at(v, &["text"])),
    ("text.value", |v: &JsonValue| string_at(v, &["text", "value"])),
    ("value", |v: &JsonValue| string_at(v, &["value"])),
    ("content", |v: &JsonValue| string_at(v, &["content"])),
    ("document.text", |v: &JsonValue| string_at(v, &["document", "text"])),
    ("html.text", |v: &JsonValue| string_at(v, &["html", "text"])),
    ("result.text", |v: &JsonValue| string_at(v, &["result", "text"])),
];

fn string_at(value: &JsonValue, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |current, key| current.get(key))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// 从回调负载中提取文本
///
/// # 返回
/// 返回 (命中的格式名, 文本)，没有任何格式命中时返回 `None`
pub fn extract_processed_text(payload: &JsonValue) -> Option<(&'static str, String)> {
    EXTRACTORS
        .iter()
        .find_map(|(name, extract)| extract(payload).map(|text| (*name, text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_each_shape() {
        let cases = vec![
            (json!("plain"), "string"),
            (json!({"text": "plain"}), "text"),
            (json!({"text": {"value": "plain"}}), "text.value"),
            (json!({"value": "plain"}), "value"),
            (json!({"content": "plain"}), "content"),
            (json!({"document": {"text": "plain"}}), "document.text"),
            (json!({"html": {"text": "plain"}}), "html.text"),
            (json!({"result": {"text": "plain"}}), "result.text"),
        ];

        for (payload, expected) in cases {
            let (name, text) = extract_processed_text(&payload).unwrap();
            assert_eq!(name, expected, "payload: {}", payload);
            assert_eq!(text, "plain");
        }
    }

    #[test]
    fn test_first_match_wins() {
        let payload = json!({"value": "second", "content": "third", "text": "first"});
        assert_eq!(extract_processed_text(&payload).unwrap().1, "first");
    }

    #[test]
    fn test_non_string_text_falls_through() {
        // text 是对象但没有 value，继续尝试后面的格式
        let payload = json!({"text": {"other": 1}, "content": "fallback"});
        assert_eq!(
            extract_processed_text(&payload),
            Some(("content", "fallback".to_string()))
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_processed_text(&json!({"foo": "bar"})), None);
        assert_eq!(extract_processed_text(&json!(42)), None);
    }
}
