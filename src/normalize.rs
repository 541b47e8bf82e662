// 该文件是 Kanwu （看物） 项目的一部分。
// src/normalize.rs - 坐标框归一化与计数
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

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::detection::{Detection, DetectionSet, ObjectCounts, RAW_SCALE, RawBox, RawDetection};

#[derive(Error, Debug, PartialEq)]
pub enum ShapeError {
  #[error("条目 '{label}' 不是数组")]
  NotAnArray { label: String },
  #[error("条目 '{label}' 应包含 4 个数值, 实际 {len} 个")]
  WrongLength { label: String, len: usize },
  #[error("条目 '{label}' 第 {index} 个坐标不是数值")]
  NotANumber { label: String, index: usize },
}

impl TryFrom<(&String, &Value)> for RawDetection {
  type Error = ShapeError;

  fn try_from((label, value): (&String, &Value)) -> Result<Self, Self::Error> {
    let items = value.as_array().ok_or_else(|| ShapeError::NotAnArray {
      label: label.clone(),
    })?;

    if items.len() != 4 {
      return Err(ShapeError::WrongLength {
        label: label.clone(),
        len: items.len(),
      });
    }

    let mut coords = [0.0f64; 4];
    for (index, (slot, item)) in coords.iter_mut().zip(items).enumerate() {
      *slot = item.as_f64().ok_or_else(|| ShapeError::NotANumber {
        label: label.clone(),
        index,
      })?;
    }

    Ok(RawDetection {
      label: label.clone(),
      bbox: RawBox(coords),
    })
  }
}

/// 对解析结果逐条做形状校验
pub fn check_shape(map: &Map<String, Value>) -> Result<Vec<RawDetection>, ShapeError> {
  map.iter().map(RawDetection::try_from).collect()
}

/// 把模型坐标缩放为归一化坐标，同时统计各对象数量
pub fn normalize(map: &Map<String, Value>) -> Result<(DetectionSet, ObjectCounts), ShapeError> {
  let raw = check_shape(map)?;

  let detections: DetectionSet = raw
    .into_iter()
    .map(|RawDetection { label, bbox }| {
      if bbox.0.iter().any(|v| !(0.0..=RAW_SCALE).contains(v)) {
        warn!("条目 '{}' 的坐标超出 0~1000: {:?}", label, bbox.0);
      }
      Detection {
        label,
        bbox: bbox.to_unit(),
      }
    })
    .collect();

  let counts = detections.counts();
  debug!("归一化 {} 个检测框, {} 类对象", detections.len(), counts.len());

  Ok((detections, counts))
}
