// 该文件是 Kanwu （看物） 项目的一部分。
// src/parse.rs - 模型回复文本清洗与解析
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! 语言模型经常把结构化输出包在代码块里，并带上语言标记、单引号和多余的逗号。
//! 这里按固定顺序执行若干清洗步骤，最后做一次严格的 JSON 解析。

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

const FENCE: &str = "```";
const CLOSING_FENCE: &str = "```\n";
const LANGUAGE_TAGS: [&str; 2] = ["json", "python"];

#[derive(Error, Debug)]
pub enum ParseError {
  #[error("JSON 解析错误: {0}")]
  InvalidJson(#[from] serde_json::Error),
  #[error("回复不是 JSON 对象, 实际类型: {0}")]
  NotAnObject(&'static str),
}

/// 清洗步骤，按 `Pass::ORDERED` 的顺序执行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
  /// 截掉第一个闭合代码块标记之后的内容
  TruncateTrailer,
  /// 去掉代码块标记和语言标记
  StripFence,
  /// 单引号替换为双引号
  NormalizeQuotes,
  /// 删除换行
  JoinLines,
  /// `,}` 替换为 `}`
  DropTrailingCommas,
}

impl Pass {
  pub const ORDERED: [Pass; 5] = [
    Pass::TruncateTrailer,
    Pass::StripFence,
    Pass::NormalizeQuotes,
    Pass::JoinLines,
    Pass::DropTrailingCommas,
  ];

  pub fn apply(self, text: &str) -> String {
    match self {
      Pass::TruncateTrailer => truncate_trailer(text).to_string(),
      Pass::StripFence => strip_fence(text).to_string(),
      Pass::NormalizeQuotes => text.replace('\'', "\""),
      Pass::JoinLines => text.replace(['\n', '\r'], ""),
      Pass::DropTrailingCommas => text.replace(",}", "}"),
    }
  }
}

fn truncate_trailer(text: &str) -> &str {
  // 开头的裸代码块标记属于开启标记，不参与截断
  let start = text.len() - text.trim_start().len();
  let skip = if text[start..].starts_with(CLOSING_FENCE) {
    start + CLOSING_FENCE.len()
  } else {
    0
  };

  match text[skip..].find(CLOSING_FENCE) {
    Some(pos) => &text[..skip + pos],
    None => text,
  }
}

fn strip_fence(text: &str) -> &str {
  let text = text.trim().trim_matches('`').trim_start();
  let text = LANGUAGE_TAGS
    .iter()
    .find_map(|tag| {
      text
        .get(..tag.len())
        .filter(|head| head.eq_ignore_ascii_case(tag))
        .map(|_| &text[tag.len()..])
    })
    .unwrap_or(text);
  text.trim()
}

/// 依次执行全部清洗步骤，返回可直接解析的文本
pub fn clean(text: &str) -> String {
  Pass::ORDERED
    .iter()
    .fold(text.to_string(), |acc, pass| pass.apply(&acc))
}

/// 把模型回复解析为保持键顺序的 JSON 对象
pub fn parse_response(text: &str) -> Result<Map<String, Value>, ParseError> {
  let cleaned = clean(text);
  debug!("清洗后的回复: {}", cleaned);

  match serde_json::from_str::<Value>(&cleaned)? {
    Value::Object(map) => Ok(map),
    other => Err(ParseError::NotAnObject(json_kind(&other))),
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_fenced_response_with_commentary() {
    let text = "```json\n{'cat_0': [100,100,400,400],}\n```\nExtra commentary";
    let map = parse_response(text).unwrap();

    assert_eq!(Value::Object(map), json!({"cat_0": [100, 100, 400, 400]}));
  }

  #[test]
  fn test_parse_keeps_textual_key_order() {
    let text = "```json\n{\n  \"zebra_0\": [1, 2, 3, 4],\n  \"apple_0\": [5, 6, 7, 8],\n  \"mango_0\": [9, 10, 11, 12]\n}\n```";
    let map = parse_response(text).unwrap();
    let keys: Vec<_> = map.keys().map(String::as_str).collect();

    assert_eq!(keys, vec!["zebra_0", "apple_0", "mango_0"]);
  }

  #[test]
  fn test_parse_is_idempotent_on_clean_output() {
    let text = "```python\n{'cup_0': [10, 20, 30, 40], 'cup_1': [50, 60, 70, 80]}\n```";
    let first = parse_response(text).unwrap();
    let reparsed = parse_response(&Value::Object(first.clone()).to_string()).unwrap();

    assert_eq!(first, reparsed);
  }

  #[test]
  fn test_parse_bare_fence_without_language_tag() {
    let text = "```\n{\"dog_0\": [0, 0, 1000, 1000]}\n```\n";
    let map = parse_response(text).unwrap();

    assert_eq!(Value::Object(map), json!({"dog_0": [0, 0, 1000, 1000]}));
  }

  #[test]
  fn test_parse_unfenced_response() {
    let map = parse_response("{\"dog_0\": [1, 2, 3, 4]}").unwrap();
    assert_eq!(map.len(), 1);
  }

  #[test]
  fn test_parse_rejects_malformed_block() {
    let err = parse_response("```json\n{'cat_0': [100, 100\n```").unwrap_err();
    assert!(matches!(err, ParseError::InvalidJson(_)));
  }

  #[test]
  fn test_parse_rejects_non_object() {
    let err = parse_response("[1, 2, 3, 4]").unwrap_err();
    assert!(matches!(err, ParseError::NotAnObject("array")));
  }

  #[test]
  fn test_apostrophe_in_label_is_not_recovered() {
    assert!(parse_response("{'driver's_seat_0': [1, 2, 3, 4]}").is_err());
  }

  #[test]
  fn test_truncate_trailer_keeps_text_before_closing_fence() {
    let text = "```json\n{}\n```\nnotes\n```\nmore";
    assert_eq!(Pass::TruncateTrailer.apply(text), "```json\n{}\n");
  }

  #[test]
  fn test_strip_fence_removes_language_tag() {
    assert_eq!(Pass::StripFence.apply("```JSON\n{}\n"), "{}");
    assert_eq!(Pass::StripFence.apply("```python\n{}```"), "{}");
    assert_eq!(Pass::StripFence.apply("  {}  "), "{}");
  }

  #[test]
  fn test_quote_and_comma_passes() {
    assert_eq!(Pass::NormalizeQuotes.apply("{'a': 1}"), "{\"a\": 1}");
    assert_eq!(Pass::JoinLines.apply("{\r\n\"a\": 1,\n}"), "{\"a\": 1,}");
    assert_eq!(Pass::DropTrailingCommas.apply("{\"a\": [1],}"), "{\"a\": [1]}");
  }
}
