// 该文件是 Kanwu （看物） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::{Parser, Subcommand};
use url::Url;

/// Kanwu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 打印发送给模型的提示词
  Prompt {
    /// 待检测对象（逗号分隔），省略时打印列举对象的提示词
    #[arg(long, value_name = "OBJECTS")]
    objects: Option<String>,
  },

  /// 从模型的列举回复中解析对象列表
  Objects {
    /// 模型来源，例如 replay:///path/to/objects.txt
    #[arg(long, value_name = "MODEL")]
    model: Url,
    /// 图像来源，例如 image:///path/to/photo.jpg
    #[arg(long, value_name = "SOURCE")]
    input: Url,
  },

  /// 检测、计数并绘制检测框
  Annotate {
    /// 图像来源，例如 image:///path/to/photo.jpg
    #[arg(long, value_name = "SOURCE")]
    input: Url,
    /// 检测框模型来源，例如 replay:///path/to/boxes.txt
    #[arg(long, value_name = "MODEL")]
    model: Url,
    /// 输出路径，例如 image:///path/to/out.png?record
    #[arg(long, value_name = "OUTPUT")]
    output: Url,
    /// 待检测对象（逗号分隔）
    #[arg(long, value_name = "OBJECTS", conflicts_with = "enumerate")]
    objects: Option<String>,
    /// 用于列举对象的模型来源
    #[arg(long, value_name = "MODEL")]
    enumerate: Option<Url>,
  },
}
