// 该文件是 Kanwu （看物） 项目的一部分。
// src/model.rs - 多模态模型调用接口
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

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

/// 多模态模型：给定图像和提示词，返回文本回复
pub trait Generate {
  type Error: std::error::Error + Send + Sync + 'static;

  fn generate(&self, image: &[u8], prompt: &str) -> Result<String, Self::Error>;
}

impl<G: Generate + ?Sized> Generate for &G {
  type Error = G::Error;

  fn generate(&self, image: &[u8], prompt: &str) -> Result<String, Self::Error> {
    (**self).generate(image, prompt)
  }
}

mod replay;
pub use self::replay::{ReplayError, ReplayModel};

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("回放模型错误: {0}")]
  ReplayError(#[from] ReplayError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum ModelWrapper {
  Replay(ReplayModel),
}

impl FromUrl for ModelWrapper {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() == ReplayModel::SCHEME {
      let model = ReplayModel::from_url(url)?;
      return Ok(ModelWrapper::Replay(model));
    }
    Err(ModelError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl Generate for ModelWrapper {
  type Error = ModelError;

  fn generate(&self, image: &[u8], prompt: &str) -> Result<String, Self::Error> {
    match self {
      ModelWrapper::Replay(model) => Ok(model.generate(image, prompt)?),
    }
  }
}
