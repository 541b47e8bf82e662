// 该文件是 Kanwu （看物） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use kanwu::{
  FromUrl,
  input::ImageFileInput,
  model::{Generate, ModelWrapper},
  output::{OutputWrapper, draw::Draw},
  prompt::{ENUMERATE_PROMPT, detection_prompt, parse_enumerate_response, parse_object_list},
  task::{AnalyzeTask, OneShotTask, Task},
};

use args::{Args, Command};

/// 让模型列举图像中的对象
fn enumerate_objects(model: &ModelWrapper, input: &ImageFileInput) -> Result<Vec<String>> {
  let response = model
    .generate(input.bytes(), ENUMERATE_PROMPT)
    .context("列举对象失败")?;
  info!("模型列举的对象: {}", response.trim());

  Ok(parse_enumerate_response(&response))
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  match args.command {
    Command::Prompt { objects } => {
      let prompt = match objects {
        Some(text) => detection_prompt(parse_object_list(&text).as_slice()).context("没有选择对象")?,
        None => ENUMERATE_PROMPT.to_string(),
      };
      println!("{}", prompt);
    }

    Command::Objects { model, input } => {
      let model = ModelWrapper::from_url(&model)?;
      let input = ImageFileInput::from_url(&input)?;
      for object in enumerate_objects(&model, &input)? {
        println!("{}", object);
      }
    }

    Command::Annotate {
      input,
      model,
      output,
      objects,
      enumerate,
    } => {
      info!("输入来源: {}", input);
      info!("模型来源: {}", model);
      info!("输出路径: {}", output);

      let input = ImageFileInput::from_url(&input)?;
      let model = ModelWrapper::from_url(&model)?;
      let output = OutputWrapper::from_url(&output)?;

      let objects = match (objects, enumerate) {
        (Some(text), _) => parse_object_list(&text),
        (None, Some(url)) => enumerate_objects(&ModelWrapper::from_url(&url)?, &input)?,
        (None, None) => Vec::new(),
      };

      let Some(prompt) = detection_prompt(objects.as_slice()) else {
        warn!("没有选择对象");
        return Ok(());
      };
      info!("检测提示词: {}", prompt);

      let task = OneShotTask::new(AnalyzeTask::new(Draw::new()?), prompt);
      let analysis = task.run_task(input, model, output)?;

      match analysis.message {
        None => {
          println!("检测到的对象:");
          print!("{}", analysis.counts);
        }
        Some(message) => {
          eprintln!("错误: 无法生成标注图像: {}", message);
        }
      }
    }
  }

  Ok(())
}
