// 该文件是 Kanwu （看物） 项目的一部分。
// src/model/replay.rs - 回放已记录的模型回复
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::Generate, url_file_path};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{found}'")]
  SchemeMismatch {
    expected: &'static str,
    found: String,
  },
  #[error("读取回复文件 {path:?} 失败: {source}")]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
}

/// 从文件读取预先记录的模型回复，忽略图像与提示词
#[derive(Debug, Clone)]
pub struct ReplayModel {
  path: PathBuf,
}

impl ReplayModel {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl FromUrlWithScheme for ReplayModel {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayModel {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayError::SchemeMismatch {
        expected: Self::SCHEME,
        found: url.scheme().to_string(),
      });
    }

    Ok(ReplayModel::new(url_file_path(url)))
  }
}

impl Generate for ReplayModel {
  type Error = ReplayError;

  fn generate(&self, image: &[u8], prompt: &str) -> Result<String, Self::Error> {
    info!("回放模型回复: {}", self.path.display());
    debug!("图像 {} 字节, 提示词: {}", image.len(), prompt);

    std::fs::read_to_string(&self.path).map_err(|source| ReplayError::IoError {
      path: self.path.clone(),
      source,
    })
  }
}
