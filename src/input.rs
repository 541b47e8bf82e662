// 该文件是 Kanwu （看物） 项目的一部分。
// src/input.rs - 图像输入
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
use tracing::debug;

mod read_image_file;
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[derive(Error, Debug)]
pub enum ImageLoadError {
  #[error("图像数据为空")]
  Empty,
  #[error("图像解码错误: {0}")]
  Decode(#[from] image::ImageError),
}

/// 把图像字节解码为 RGB 图像
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, ImageLoadError> {
  if bytes.is_empty() {
    return Err(ImageLoadError::Empty);
  }

  let image = image::load_from_memory(bytes)?;
  debug!("图像解码完成: {}x{}", image.width(), image.height());
  Ok(image.into_rgb8())
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{ImageFormat, Rgb};
  use std::io::Cursor;

  #[test]
  fn test_decode_png_bytes() {
    let source = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));
    let mut bytes = Vec::new();
    source
      .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
      .unwrap();

    let decoded = decode_image(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (4, 3));
    assert_eq!(decoded.get_pixel(2, 1), &Rgb([10, 20, 30]));
  }

  #[test]
  fn test_decode_rejects_garbage() {
    assert!(matches!(
      decode_image(b"definitely not an image"),
      Err(ImageLoadError::Decode(_))
    ));
    assert!(matches!(decode_image(&[]), Err(ImageLoadError::Empty)));
  }
}
