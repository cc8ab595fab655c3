//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::Parser;
use std::path::PathBuf;

/// 将任意文件隐藏在图像 Alpha 通道中的命令行工具，输出为无损格式图像 (如 PNG)。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "将任意文件隐藏在图像 Alpha 通道的第 3 位中，或从经过隐写的图像中恢复文件。输出图像必须使用能保留 Alpha 通道的无损格式 (PNG, TIFF, WebP, QOI)。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏) 和 recover (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 将文件 (或消息) 隐藏到图像中。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复文件 (或消息)。
    Recover(RecoverArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的载体图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文件路径。
    #[arg(short, long)]
    pub payload: PathBuf,

    /// 结果图像的输出路径。默认为 `<图像名>.steg.<扩展名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 消息模式：不记录文件名，使用 8 字节帧头。
    #[arg(short, long)]
    pub message: bool,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏数据的图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复内容的输出路径。文件模式下默认使用隐藏时记录的文件名，
    /// 消息模式下默认只打印到终端。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 消息模式：按 8 字节帧头解析。
    #[arg(short, long)]
    pub message: bool,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}
