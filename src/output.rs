// 该文件是 Kanwu （看物） 项目的一部分。
// src/output.rs - 结果输出
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

use image::RgbImage;
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, detection::DetectionSet};

/// 接收已标注图像及其检测结果
pub trait Render: Sized {
  type Error;
  fn render_result(&self, annotated: &RgbImage, detections: &DetectionSet) -> Result<(), Self::Error>;
}

pub mod draw;

mod save_image_file;
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  SaveImageFileOutput(SaveImageFileOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() == SaveImageFileOutput::SCHEME {
      let output = SaveImageFileOutput::from_url(url)?;
      return Ok(OutputWrapper::SaveImageFileOutput(output));
    }
    Err(OutputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl Render for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, annotated: &RgbImage, detections: &DetectionSet) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::SaveImageFileOutput(output) => Ok(output.render_result(annotated, detections)?),
    }
  }
}
