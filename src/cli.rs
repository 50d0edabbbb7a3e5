//! # 命令行接口模块
//!
//! 使用 `clap` 定义配套工具的命令行结构，包括子命令和参数。
//! 工具只是库的一层薄壳：负责图像文件的读写，隐写本身交给库完成。

use clap::Parser;
use std::path::PathBuf;

/// 把任意文件作为附件隐藏到无损格式图像 (如 PNG, BMP) 的 RGB 最低有效位中，或将其恢复。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "把任意文件作为附件隐藏到无损格式图像 (如 PNG, BMP) 的 RGB 最低有效位中，或将其恢复。Alpha 通道保持不变。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 在图像中隐藏一个附件文件。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复附件。
    Recover(RecoverArgs),

    /// 显示图像中附件的修订号与长度。
    Info(InfoArgs),

    /// 显示图像最多能携带的附件字节数。
    Capacity(CapacityArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的附件文件路径。
    #[arg(short, long)]
    pub attachment: PathBuf,

    /// 结果图像的输出路径，默认为输入图像旁的 `doctored_<名称>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 写入头部的修订号，由调用方自行解释。
    #[arg(short, long, default_value_t = 0)]
    pub revision: u16,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏附件的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复出的附件的保存路径，默认为图像旁的 `recovered_<名称>.bin`。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'info' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// 要检查的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CapacityArgs {
    /// 要计算容量的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,
}
