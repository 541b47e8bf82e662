// 该文件是 Kanwu （看物） 项目的一部分。
// src/prompt.rs - 提示词构造与对象列表解析
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

use std::sync::LazyLock;

use regex::Regex;

/// 让模型列出图像中全部对象的提示词
pub const ENUMERATE_PROMPT: &str = "Enumerate all the objects found in the image. Some objects might \
appear multiple times. Only mention each object once. Output as a comma separated list. \
Do not add any other information.";

static LIST_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\[(.*?)\]").expect("列表正则表达式无效"));

/// 按逗号拆分对象列表，去掉空白项
pub fn parse_object_list(text: &str) -> Vec<String> {
  text
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::to_string)
    .collect()
}

/// 构造检测框提示词，对象列表为空时返回 `None`
pub fn detection_prompt<S: AsRef<str>>(objects: &[S]) -> Option<String> {
  let first: &str = objects.first()?.as_ref();
  let names: Vec<&str> = objects.iter().map(|object| object.as_ref()).collect();
  let objects_string = names.join(", ");

  Some(format!(
    "Return bounding boxes for each object: {objects_string} in the following format as a list.\n \
     {{'{first}_0': [ymin, xmin, ymax, xmax], ...}}. If there are more than one instance of an \
     object, add them as 'object_0', 'object_1', etc. Output only a valid JSON. Do not add any \
     other information."
  ))
}

/// 提取文本中第一个方括号列表的各项，去掉两侧空白和引号
pub fn extract_list(text: &str) -> Option<Vec<String>> {
  let captures = LIST_PATTERN.captures(text)?;
  let items = captures
    .get(1)?
    .as_str()
    .split(',')
    .map(|item| item.trim().trim_matches('"').trim_matches('\'').to_string())
    .collect();
  Some(items)
}

/// 解析模型列举对象的回复，方括号列表优先，否则按逗号拆分
pub fn parse_enumerate_response(text: &str) -> Vec<String> {
  match extract_list(text) {
    Some(items) => items.into_iter().filter(|item| !item.is_empty()).collect(),
    None => parse_object_list(text),
  }
}
