// 该文件是 Kanwu （看物） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::debug;

use crate::detection::{DetectionSet, UnitBox};

// 绘制常量
const LABEL_FONT_SIZE: f32 = 16.0;
const BORDER_WIDTH: i32 = 4;
const LABEL_OFFSET: (i32, i32) = (8, 6);

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("无法加载嵌入的字体文件: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
  #[error("调色板不能为空")]
  EmptyPalette,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
  pub name: &'static str,
  pub rgb: [u8; 3],
}

const fn named(name: &'static str, r: u8, g: u8, b: u8) -> NamedColor {
  NamedColor {
    name,
    rgb: [r, g, b],
  }
}

/// 默认调色板，取 CSS 颜色名对应的 RGB 值
pub const NAMED_COLORS: [NamedColor; 23] = [
  named("red", 255, 0, 0),
  named("green", 0, 128, 0),
  named("blue", 0, 0, 255),
  named("yellow", 255, 255, 0),
  named("orange", 255, 165, 0),
  named("pink", 255, 192, 203),
  named("purple", 128, 0, 128),
  named("brown", 165, 42, 42),
  named("gray", 128, 128, 128),
  named("beige", 245, 245, 220),
  named("turquoise", 64, 224, 208),
  named("cyan", 0, 255, 255),
  named("magenta", 255, 0, 255),
  named("lime", 0, 255, 0),
  named("navy", 0, 0, 128),
  named("maroon", 128, 0, 0),
  named("teal", 0, 128, 128),
  named("olive", 128, 128, 0),
  named("coral", 255, 127, 80),
  named("lavender", 230, 230, 250),
  named("violet", 238, 130, 238),
  named("gold", 255, 215, 0),
  named("silver", 192, 192, 192),
];

/// 按检测序号循环取色
#[derive(Debug, Clone)]
pub struct Palette {
  colors: Vec<NamedColor>,
}

impl Default for Palette {
  fn default() -> Self {
    Self {
      colors: NAMED_COLORS.to_vec(),
    }
  }
}

impl Palette {
  pub fn new(colors: Vec<NamedColor>) -> Result<Self, DrawError> {
    if colors.is_empty() {
      return Err(DrawError::EmptyPalette);
    }
    Ok(Self { colors })
  }

  pub fn len(&self) -> usize {
    self.colors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.colors.is_empty()
  }

  pub fn index_of(&self, i: usize) -> usize {
    i % self.colors.len()
  }

  pub fn color(&self, i: usize) -> NamedColor {
    self.colors[self.index_of(i)]
  }
}

/// 像素坐标框，右下角不包含在框内
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
  pub x_min: i32,
  pub y_min: i32,
  pub x_max: i32,
  pub y_max: i32,
}

impl PixelRect {
  /// x 乘以宽度，y 乘以高度，向零截断；超出图像的坐标夹到边框宽度以外
  pub fn from_unit(bbox: &UnitBox, width: u32, height: u32) -> Self {
    let [x1, y1, x2, y2] = bbox.0;
    let to_pixel = |v: f64, dim: u32| {
      let margin = BORDER_WIDTH as i64;
      let pixel = (v * dim as f64) as i64;
      pixel.clamp(-margin, dim as i64 + margin) as i32
    };
    let (x1, x2) = (to_pixel(x1, width), to_pixel(x2, width));
    let (y1, y2) = (to_pixel(y1, height), to_pixel(y2, height));

    PixelRect {
      x_min: x1.min(x2),
      y_min: y1.min(y2),
      x_max: x1.max(x2),
      y_max: y1.max(y2),
    }
  }

  pub fn width(&self) -> i32 {
    self.x_max.saturating_sub(self.x_min)
  }

  pub fn height(&self) -> i32 {
    self.y_max.saturating_sub(self.y_min)
  }
}

pub struct Draw {
  font: FontArc,
  font_scale: PxScale,
  palette: Palette,
  border_width: i32,
  label_offset: (i32, i32),
}

impl Draw {
  pub fn new() -> Result<Self, DrawError> {
    let font_data = include_bytes!("../../assets/DejaVuSans.ttf");
    let font = FontArc::try_from_slice(font_data)?;

    Ok(Self {
      font,
      font_scale: PxScale::from(LABEL_FONT_SIZE),
      palette: Palette::default(),
      border_width: BORDER_WIDTH,
      label_offset: LABEL_OFFSET,
    })
  }

  pub fn with_palette(mut self, palette: Palette) -> Self {
    self.palette = palette;
    self
  }

  /// 在源图像的副本上绘制所有检测框，源图像保持不变
  pub fn render(&self, source: &RgbImage, detections: &DetectionSet) -> RgbImage {
    let mut image = source.clone();
    let (width, height) = image.dimensions();

    for (i, detection) in detections.iter().enumerate() {
      let color = self.palette.color(i);
      let rect = PixelRect::from_unit(&detection.bbox, width, height);
      debug!(
        "绘制 {} ({}): {:?}",
        detection.label, color.name, rect
      );
      self.draw_bbox_with_label(&mut image, rect, &detection.label, Rgb(color.rgb));
    }

    image
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, rect: PixelRect, label: &str, color: Rgb<u8>) {
    // 边框由外向内逐像素加粗，超出图像的部分由 imageproc 裁剪
    for t in 0..self.border_width {
      let w = rect.width().saturating_sub(2 * t);
      let h = rect.height().saturating_sub(2 * t);
      if t > 0 && (w <= 0 || h <= 0) {
        break;
      }
      let inner = Rect::at(rect.x_min.saturating_add(t), rect.y_min.saturating_add(t))
        .of_size(w.max(1) as u32, h.max(1) as u32);
      draw_hollow_rect_mut(image, inner, color);
    }

    let (dx, dy) = self.label_offset;
    draw_text_mut(
      image,
      color,
      rect.x_min.saturating_add(dx),
      rect.y_min.saturating_add(dy),
      self.font_scale,
      &self.font,
      label,
    );
  }
}

/// 以文本形式记录检测框，每行 `label, x_min, y_min, x_max, y_max`
pub struct Record;

impl Record {
  pub fn format(detections: &DetectionSet) -> String {
    detections
      .iter()
      .map(|item| {
        let [x_min, y_min, x_max, y_max] = item.bbox.0;
        format!(
          "{}, {:.4}, {:.4}, {:.4}, {:.4}",
          item.label, x_min, y_min, x_max, y_max
        )
      })
      .collect::<Vec<_>>()
      .join("\n")
  }

  pub fn record(detections: &DetectionSet, path: &std::path::Path) -> Result<(), DrawError> {
    std::fs::write(path.with_extension("txt"), Self::format(detections))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detection::{Detection, RawBox};

  fn detection(label: &str, bbox: UnitBox) -> Detection {
    Detection {
      label: label.to_string(),
      bbox,
    }
  }

  #[test]
  fn test_pixel_rect_full_image() {
    let rect = PixelRect::from_unit(&UnitBox::FULL, 1000, 2000);
    assert_eq!(
      rect,
      PixelRect {
        x_min: 0,
        y_min: 0,
        x_max: 1000,
        y_max: 2000
      }
    );
  }

  #[test]
  fn test_pixel_rect_truncates() {
    let rect = PixelRect::from_unit(&UnitBox([0.1299, 0.25, 0.7, 0.999]), 100, 10);
    assert_eq!(
      rect,
      PixelRect {
        x_min: 12,
        y_min: 2,
        x_max: 70,
        y_max: 9
      }
    );
  }

  #[test]
  fn test_pixel_rect_clamps_far_out_of_range_coordinates() {
    let rect = PixelRect::from_unit(&UnitBox([-1e9, -1e9, 1e9, 1e9]), 50, 50);
    assert_eq!(
      rect,
      PixelRect {
        x_min: -4,
        y_min: -4,
        x_max: 54,
        y_max: 54
      }
    );

    let rect = PixelRect::from_unit(&UnitBox([1e9, 1e9, 1e9, 1e9]), 50, 30);
    assert_eq!((rect.x_min, rect.y_min, rect.x_max, rect.y_max), (54, 34, 54, 34));
  }

  #[test]
  fn test_render_out_of_range_boxes_without_panicking() {
    let draw = Draw::new().unwrap();
    let source = RgbImage::new(50, 50);
    let detections: DetectionSet = [
      detection("huge_0", RawBox([-1e12, -1e12, 1e12, 1e12]).to_unit()),
      detection("far_0", RawBox([1e12, 1e12, 1e12, 1e12]).to_unit()),
      detection("neg_0", RawBox([-1e12, -1e12, -1e12, -1e12]).to_unit()),
    ]
    .into_iter()
    .collect();

    let image = draw.render(&source, &detections);
    assert_eq!(image.dimensions(), (50, 50));
  }

  #[test]
  fn test_pixel_rect_orders_inverted_corners() {
    let rect = PixelRect::from_unit(&UnitBox([0.5, 0.5, 0.1, 0.2]), 100, 100);
    assert_eq!((rect.x_min, rect.y_min, rect.x_max, rect.y_max), (10, 20, 50, 50));
  }

  #[test]
  fn test_palette_cycles() {
    let palette = Palette::new(NAMED_COLORS[..16].to_vec()).unwrap();
    assert_eq!(palette.index_of(15), 15);
    assert_eq!(palette.index_of(16), 0);
    assert_eq!(palette.color(16), palette.color(0));
    assert_eq!(Palette::default().len(), 23);
    assert!(matches!(Palette::new(Vec::new()), Err(DrawError::EmptyPalette)));
  }

  #[test]
  fn test_render_reuses_first_color_after_palette_wraps() {
    let palette = Palette::new(NAMED_COLORS[..16].to_vec()).unwrap();
    let draw = Draw::new().unwrap().with_palette(palette.clone());
    let source = RgbImage::new(2000, 100);

    let detections: DetectionSet = (0..20)
      .map(|i| {
        let x = (i * 50) as f64;
        detection(&format!("d_{}", i), RawBox([100.0, x, 900.0, x + 25.0]).to_unit())
      })
      .collect();

    let image = draw.render(&source, &detections);

    for (i, item) in detections.iter().enumerate() {
      let rect = PixelRect::from_unit(&item.bbox, 2000, 100);
      let pixel = image.get_pixel(rect.x_min as u32, rect.y_min as u32);
      assert_eq!(pixel, &Rgb(palette.color(i).rgb), "detection {}", i);
    }

    let first = image.get_pixel(0, 10);
    let seventeenth = {
      let rect = PixelRect::from_unit(&detections.items[16].bbox, 2000, 100);
      image.get_pixel(rect.x_min as u32, rect.y_min as u32)
    };
    assert_eq!(first, seventeenth);
  }

  #[test]
  fn test_render_leaves_source_untouched() {
    let draw = Draw::new().unwrap();
    let source = RgbImage::from_pixel(64, 48, Rgb([1, 2, 3]));
    let detections: DetectionSet = [detection("cat_0", UnitBox([0.1, 0.1, 0.9, 0.9]))]
      .into_iter()
      .collect();

    let image = draw.render(&source, &detections);

    assert!(source.pixels().all(|p| *p == Rgb([1, 2, 3])));
    assert_eq!(image.dimensions(), (64, 48));
    assert_eq!(image.get_pixel(6, 4), &Rgb([255, 0, 0]));
  }

  #[test]
  fn test_render_border_is_four_pixels_wide() {
    let draw = Draw::new().unwrap();
    let source = RgbImage::new(100, 100);
    let detections: DetectionSet = [detection("x", UnitBox([0.0, 0.5, 1.0, 1.0]))]
      .into_iter()
      .collect();

    let image = draw.render(&source, &detections);
    let red = Rgb([255, 0, 0]);

    // 左边框中段
    for x in 0..4 {
      assert_eq!(image.get_pixel(x, 90), &red);
    }
    assert_eq!(image.get_pixel(4, 90), &Rgb([0, 0, 0]));
    // 右边框贴着图像边缘
    for x in 96..100 {
      assert_eq!(image.get_pixel(x, 90), &red);
    }
    assert_eq!(image.get_pixel(95, 90), &Rgb([0, 0, 0]));
  }

  #[test]
  fn test_render_full_image_box_stays_in_bounds() {
    let draw = Draw::new().unwrap();
    let source = RgbImage::new(10, 20);
    let detections: DetectionSet = [detection("all", UnitBox::FULL)].into_iter().collect();

    let image = draw.render(&source, &detections);
    assert_eq!(image.get_pixel(0, 0), &Rgb([255, 0, 0]));
    assert_eq!(image.get_pixel(9, 19), &Rgb([255, 0, 0]));
  }

  #[test]
  fn test_record_format() {
    let detections: DetectionSet = [
      detection("cat_0", UnitBox([0.1, 0.2, 0.3, 0.4])),
      detection("dog_0", UnitBox::FULL),
    ]
    .into_iter()
    .collect();

    assert_eq!(
      Record::format(&detections),
      "cat_0, 0.1000, 0.2000, 0.3000, 0.4000\ndog_0, 0.0000, 0.0000, 1.0000, 1.0000"
    );
  }
}
