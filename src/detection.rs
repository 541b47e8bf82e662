// 该文件是 Kanwu （看物） 项目的一部分。
// src/detection.rs - 检测结果数据模型
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

/// 模型坐标的满刻度
pub const RAW_SCALE: f64 = 1000.0;

/// 模型原生坐标框，顺序为 [ymin, xmin, ymax, xmax]，取值 0..=1000
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBox(pub [f64; 4]);

impl RawBox {
  pub fn y_min(&self) -> f64 {
    self.0[0]
  }

  pub fn x_min(&self) -> f64 {
    self.0[1]
  }

  pub fn y_max(&self) -> f64 {
    self.0[2]
  }

  pub fn x_max(&self) -> f64 {
    self.0[3]
  }

  /// 缩放到 [0, 1] 并重排为 [x_min, y_min, x_max, y_max]
  pub fn to_unit(&self) -> UnitBox {
    let scale = |v: f64| v / RAW_SCALE;
    UnitBox([
      scale(self.x_min()),
      scale(self.y_min()),
      scale(self.x_max()),
      scale(self.y_max()),
    ])
  }
}

/// 归一化坐标框，顺序为 [x_min, y_min, x_max, y_max]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitBox(pub [f64; 4]);

impl UnitBox {
  /// 覆盖整幅图像的框
  pub const FULL: UnitBox = UnitBox([0.0, 0.0, 1.0, 1.0]);

  /// `RawBox::to_unit` 的逆变换
  pub fn to_raw(&self) -> RawBox {
    let [x_min, y_min, x_max, y_max] = self.0.map(|v| v * RAW_SCALE);
    RawBox([y_min, x_min, y_max, x_max])
  }
}

/// 形状校验通过的模型条目
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
  pub label: String,
  pub bbox: RawBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub label: String,
  pub bbox: UnitBox,
}

impl Detection {
  /// 标签中第一个 `_` 之前的部分，没有 `_` 时为整个标签
  pub fn object_name(&self) -> &str {
    object_name(&self.label)
  }
}

pub fn object_name(label: &str) -> &str {
  match label.split_once('_') {
    Some((name, _)) => name,
    None => label,
  }
}

/// 保持模型给出顺序的检测集合，允许重复标签
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSet {
  pub items: Vec<Detection>,
}

impl DetectionSet {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }

  /// 按对象名统计数量
  pub fn counts(&self) -> ObjectCounts {
    self.iter().map(Detection::object_name).collect()
  }
}

impl FromIterator<Detection> for DetectionSet {
  fn from_iter<I: IntoIterator<Item = Detection>>(iter: I) -> Self {
    DetectionSet {
      items: iter.into_iter().collect(),
    }
  }
}

impl<'a> IntoIterator for &'a DetectionSet {
  type Item = &'a Detection;
  type IntoIter = std::slice::Iter<'a, Detection>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

/// 对象名到数量的映射，按首次出现的顺序迭代
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectCounts {
  entries: Vec<(String, usize)>,
}

impl ObjectCounts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn increment(&mut self, name: &str) {
    match self.entries.iter_mut().find(|(n, _)| n == name) {
      Some((_, count)) => *count += 1,
      None => self.entries.push((name.to_string(), 1)),
    }
  }

  pub fn get(&self, name: &str) -> Option<usize> {
    self
      .entries
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, count)| *count)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// 所有对象的总数
  pub fn total(&self) -> usize {
    self.entries.iter().map(|(_, count)| count).sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
    self.entries.iter().map(|(n, c)| (n.as_str(), *c))
  }
}

impl<'a> FromIterator<&'a str> for ObjectCounts {
  fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
    let mut counts = ObjectCounts::new();
    for name in iter {
      counts.increment(name);
    }
    counts
  }
}

impl std::fmt::Display for ObjectCounts {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (name, count) in self.iter() {
      writeln!(f, "{}: {}", name, count)?;
    }
    Ok(())
  }
}
