// 该文件是 Kanwu （看物） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::DetectionSet,
  output::{
    Render,
    draw::{DrawError, Record},
  },
  url_file_path,
};

/// 保存标注图像，`?record` 时在同目录写出同名 `.txt` 检测记录
pub struct SaveImageFileOutput {
  path: PathBuf,
  record: bool,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("记录错误: {0}")]
  RecordError(#[from] DrawError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let record = uri.query_pairs().any(|(k, _)| k == "record");

    Ok(SaveImageFileOutput {
      path: PathBuf::from(url_file_path(uri)),
      record,
    })
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      record: false,
    }
  }

  pub fn with_record(mut self, record: bool) -> Self {
    self.record = record;
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;
    info!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl Render for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, annotated: &RgbImage, detections: &DetectionSet) -> Result<(), Self::Error> {
    self.save_image(annotated)?;
    if self.record {
      Record::record(detections, &self.path)?;
      info!("保存检测记录: {}", self.path.with_extension("txt").display());
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detection::{Detection, UnitBox};
  use image::Rgb;

  #[test]
  fn test_from_url_reads_record_flag() {
    let url = Url::parse("image:///tmp/out/result.png?record").unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), Path::new("/tmp/out/result.png"));
    assert!(output.record);

    let url = Url::parse("image:///tmp/out/result.png").unwrap();
    assert!(!SaveImageFileOutput::from_url(&url).unwrap().record);
  }

  #[test]
  fn test_save_creates_directories_and_record() {
    let dir = std::env::temp_dir().join(format!("kanwu-save-{}", std::process::id()));
    let path = dir.join("nested").join("out.png");
    let output = SaveImageFileOutput::new(&path).with_record(true);

    let image = RgbImage::from_pixel(8, 8, Rgb([9, 9, 9]));
    let detections: DetectionSet = [Detection {
      label: "cat_0".to_string(),
      bbox: UnitBox::FULL,
    }]
    .into_iter()
    .collect();

    output.render_result(&image, &detections).unwrap();

    let saved = image::open(&path).unwrap().into_rgb8();
    assert_eq!(saved, image);
    let record = std::fs::read_to_string(path.with_extension("txt")).unwrap();
    assert_eq!(record, "cat_0, 0.0000, 0.0000, 1.0000, 1.0000");

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
