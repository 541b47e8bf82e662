// 该文件是 Kanwu （看物） 项目的一部分。
// src/task.rs - 检测计数任务编排
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
use tracing::{error, info};

use crate::{
  detection::{DetectionSet, ObjectCounts},
  input::{ImageFileInput, ImageLoadError, decode_image},
  model::Generate,
  normalize::{ShapeError, normalize},
  output::{Render, draw::Draw},
  parse::{ParseError, parse_response},
};

#[derive(Error, Debug)]
pub enum AnalyzeError {
  #[error("模型没有返回内容: {0}")]
  UpstreamEmpty(String),
  #[error("模型回复解析失败: {0}")]
  Parse(#[from] ParseError),
  #[error("检测框格式错误: {0}")]
  Shape(#[from] ShapeError),
  #[error("图像加载失败: {0}")]
  ImageLoad(#[from] ImageLoadError),
}

/// 一次成功分析的结果
#[derive(Debug, Clone)]
pub struct Annotated {
  pub image: RgbImage,
  pub detections: DetectionSet,
  pub counts: ObjectCounts,
}

/// 面向界面的分析结果：失败时没有图像、计数为空，并附带一条说明
#[derive(Debug, Clone, Default)]
pub struct Analysis {
  pub image: Option<RgbImage>,
  pub detections: DetectionSet,
  pub counts: ObjectCounts,
  pub message: Option<String>,
}

impl Analysis {
  pub fn failed(message: impl Into<String>) -> Self {
    Analysis {
      message: Some(message.into()),
      ..Default::default()
    }
  }

  pub fn is_success(&self) -> bool {
    self.image.is_some()
  }
}

impl From<Result<Annotated, AnalyzeError>> for Analysis {
  fn from(result: Result<Annotated, AnalyzeError>) -> Self {
    match result {
      Ok(Annotated {
        image,
        detections,
        counts,
      }) => Analysis {
        image: Some(image),
        detections,
        counts,
        message: None,
      },
      Err(e) => {
        error!("分析失败: {}", e);
        Analysis::failed(e.to_string())
      }
    }
  }
}

pub struct AnalyzeTask {
  draw: Draw,
}

impl AnalyzeTask {
  pub fn new(draw: Draw) -> Self {
    Self { draw }
  }

  /// 解析、归一化并绘制，任一步失败即返回对应错误
  pub fn try_analyze_response(
    &self,
    image_bytes: &[u8],
    response: Option<&str>,
  ) -> Result<Annotated, AnalyzeError> {
    let response = match response {
      Some(text) if !text.trim().is_empty() => text,
      Some(_) => return Err(AnalyzeError::UpstreamEmpty("回复为空".to_string())),
      None => return Err(AnalyzeError::UpstreamEmpty("没有回复".to_string())),
    };

    let map = parse_response(response)?;
    let (detections, counts) = normalize(&map)?;
    let source = decode_image(image_bytes)?;
    let image = self.draw.render(&source, &detections);
    info!("检测到 {} 个对象, {} 类", counts.total(), counts.len());

    Ok(Annotated {
      image,
      detections,
      counts,
    })
  }

  /// 同 `try_analyze_response`，但所有错误都降级为失败的 `Analysis`
  pub fn analyze_response(&self, image_bytes: &[u8], response: Option<&str>) -> Analysis {
    self.try_analyze_response(image_bytes, response).into()
  }

  /// 调用模型后完成分析，模型调用失败视为没有回复
  pub fn analyze<G: Generate>(&self, model: &G, image_bytes: &[u8], prompt: &str) -> Analysis {
    let response = match model.generate(image_bytes, prompt) {
      Ok(text) => Some(text),
      Err(e) => {
        return Analysis::from(Err::<Annotated, _>(AnalyzeError::UpstreamEmpty(e.to_string())));
      }
    };
    self.analyze_response(image_bytes, response.as_deref())
  }
}

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Analysis, Self::Error>;
}

/// 单张图像：调用模型、绘制并输出
pub struct OneShotTask {
  analyzer: AnalyzeTask,
  prompt: String,
}

impl OneShotTask {
  pub fn new(analyzer: AnalyzeTask, prompt: impl Into<String>) -> Self {
    Self {
      analyzer,
      prompt: prompt.into(),
    }
  }
}

impl<M, O> Task<ImageFileInput, M, O> for OneShotTask
where
  M: Generate,
  O: Render,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(self, input: ImageFileInput, model: M, output: O) -> Result<Analysis, Self::Error> {
    info!("开始任务: {}", input.path());
    let now = std::time::Instant::now();
    let analysis = self.analyzer.analyze(&model, input.bytes(), &self.prompt);
    info!("分析完成，耗时: {:.2?}", now.elapsed());

    if let Some(image) = &analysis.image {
      output.render_result(image, &analysis.detections)?;
    }

    Ok(analysis)
  }
}
