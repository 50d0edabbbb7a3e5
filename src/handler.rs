//! # 命令处理逻辑模块
//!
//! 包含处理各个子命令的高级业务逻辑。
//! 本模块负责图像文件的解码与保存、调用隐写库以及向用户报告结果。

use crate::cli::{CapacityArgs, HideArgs, InfoArgs, RecoverArgs};
use crate::{Image, PostcardError, PostcardInfo, capacity, read, read_info, write};
use anyhow::{Context, Result};
use colored::Colorize;
use image::ColorType;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// 解码后的载体图像：原始像素数据及其尺寸。
struct Carrier {
    width: u32,
    height: u32,
    color: ColorType,
    pixels: Vec<u8>,
}

impl Carrier {
    /// 读取图像文件并转换为 8 位 RGB 或 RGBA 像素。
    ///
    /// 带 Alpha 的图像保留 Alpha 通道，其余图像一律转换为 RGB。
    fn load(path: &Path) -> Result<Self> {
        let decoded = image::open(path).with_context(|| {
            format!(
                "Unable to read image file: {}",
                path.to_string_lossy().red().bold()
            )
        })?;

        let carrier = if decoded.color().has_alpha() {
            let rgba = decoded.to_rgba8();
            Self {
                width: rgba.width(),
                height: rgba.height(),
                color: ColorType::Rgba8,
                pixels: rgba.into_raw(),
            }
        } else {
            let rgb = decoded.to_rgb8();
            Self {
                width: rgb.width(),
                height: rgb.height(),
                color: ColorType::Rgb8,
                pixels: rgb.into_raw(),
            }
        };

        info!(
            "loaded {}x{} {:?} carrier from {}",
            carrier.width,
            carrier.height,
            carrier.color,
            path.display()
        );
        Ok(carrier)
    }

    fn channels(&self) -> u8 {
        self.color.channel_count()
    }

    fn view(&self) -> std::result::Result<Image<&[u8]>, PostcardError> {
        Image::new(self.width, self.height, self.channels(), self.pixels.as_slice())
    }

    fn view_mut(&mut self) -> std::result::Result<Image<&mut [u8]>, PostcardError> {
        let channels = self.channels();
        Image::new(self.width, self.height, channels, self.pixels.as_mut_slice())
    }

    /// 以无损格式保存像素数据，格式由扩展名决定。
    fn save(&self, path: &Path) -> Result<()> {
        image::save_buffer(path, &self.pixels, self.width, self.height, self.color).with_context(
            || {
                format!(
                    "Unable to write to target image file: {}",
                    path.to_string_lossy().red().bold()
                )
            },
        )
    }
}

/// 在输入图像旁生成默认的输出路径，如 `doctored_original.png`。
fn default_output(image: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    image.with_file_name(format!("{prefix}{stem}.{extension}"))
}

/// 输出文件已存在且未指定 `--force` 时拒绝继续。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取图像和附件文件、检查隐写空间是否足够、调用隐写库写入头部与附件，
/// 最后将结果写入目标图像文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取输入的图像或附件文件。
/// * 图像没有足够的空间来隐藏附件。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "doctored_", "png"));
    ensure_writable(&dest, args.force)?;

    let mut carrier = Carrier::load(&args.image)?;

    let attachment = fs::read(&args.attachment).with_context(|| {
        format!(
            "Unable to read attachment file: {}",
            args.attachment.to_string_lossy().red().bold()
        )
    })?;

    let mut image = carrier.view_mut()?;
    let available = capacity(&image);

    anyhow::ensure!(
        available >= attachment.len(),
        "Not enough space in the image to hide the attachment. \nRequired: {}, Available: {}",
        attachment.len().to_string().red().bold(),
        available.to_string().green().bold()
    );

    let info = PostcardInfo {
        revision: args.revision,
        attachment_size: 0,
    };
    write(&mut image, &info, &attachment).with_context(|| {
        format!(
            "Failed to hide the attachment in {}.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    carrier.save(&dest)?;

    println!(
        "The attachment ({} bytes, revision {}) has been successfully hidden and saved: {}",
        attachment.len(),
        args.revision,
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、调用隐写库恢复附件，并将其写入目标文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取输入的图像文件。
/// * 图像中没有附件，或头部已损坏。
/// * 无法写入到目标文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "recovered_", "bin"));
    ensure_writable(&output, args.force)?;

    let carrier = Carrier::load(&args.image)?;
    let image = carrier.view()?;

    let (info, attachment) = read(&image).with_context(|| {
        format!(
            "Failed to recover an attachment from '{}'. \nThe image may not contain a hidden attachment or is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    fs::write(&output, &*attachment).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            output.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The attachment ({} bytes, revision {}) has been successfully recovered and saved: {}",
        info.attachment_size,
        info.revision,
        output.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Info' 命令的执行逻辑：只读取头部并显示其内容。
///
/// # Errors
///
/// 无法读取图像，或图像中没有附件时返回错误。
pub fn handle_info(args: InfoArgs) -> Result<()> {
    let carrier = Carrier::load(&args.image)?;
    let image = carrier.view()?;

    let info = read_info(&image).with_context(|| {
        format!(
            "No attachment found in '{}'.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "Revision: {}\nAttachment size: {} bytes",
        info.revision.to_string().green().bold(),
        info.attachment_size.to_string().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令的执行逻辑：显示图像可携带的附件字节数。
///
/// # Errors
///
/// 无法读取图像时返回错误。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let carrier = Carrier::load(&args.image)?;
    let image = carrier.view()?;

    println!(
        "{} can carry {} bytes.",
        args.image.to_string_lossy().green().bold(),
        capacity(&image).to_string().green().bold()
    );
    Ok(())
}
