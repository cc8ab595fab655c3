//! # 命令处理逻辑模块
//!
//! 包含处理 `hide` 和 `recover` 子命令的高级业务逻辑。
//! 本模块负责协调文件与图像 I/O、调用核心隐写算法以及向用户报告结果。
//! 所有输出文件都在隐写/恢复完全成功后才写入。

use crate::cli::{HideArgs, RecoverArgs};
use crate::constants::{FALLBACK_EXTENSION, LOSSLESS_ALPHA_EXTENSIONS, STEG_SUFFIX};
use crate::error::StegError;
use crate::frame::{FrameBuffer, FrameMode};
use crate::steganography::{capacity, embed, extract};
use anyhow::{Context, Result};
use colored::Colorize;
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 恢复出的文件名无法使用时的替代名称。
const RECOVERED_FALLBACK_NAME: &str = "recovered.bin";

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取载体图像和负载文件、组装帧、检查隐写空间是否足够、
/// 将帧写入 Alpha 通道，最后以无损格式保存结果图像。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与模式选项的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取负载文件或载体图像。
/// * 输出路径不是能保留 Alpha 通道的无损格式。
/// * 输出文件已存在且未指定 `--force`。
/// * 图像没有足够的空间来隐藏负载。
/// * 无法写入目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let data = fs::read(&args.payload).with_context(|| {
        format!(
            "Unable to read payload file: {}",
            args.payload.to_string_lossy().red().bold()
        )
    })?;

    let filename = if args.message {
        None
    } else {
        Some(payload_file_name(&args.payload)?)
    };

    let frame = FrameBuffer::build(&data, filename.as_deref())?;

    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_hide_path(&args.image));
    let format = lossless_alpha_format(&dest)?;
    ensure_writable(&dest, args.force)?;

    let mut grid = open_carrier(&args.image)?;

    let required = frame.bit_len();
    let available = capacity(&grid);
    println!("Storing {} bits", required.to_string().bold());
    println!("{} bits available", available.to_string().bold());

    anyhow::ensure!(
        available >= required,
        "Not enough space in the image to hide the payload. \nRequired: {} bits, Available: {} bits",
        required.to_string().red().bold(),
        available.to_string().green().bold()
    );

    let stored = embed(&mut grid, &frame)?;

    let mut encoded = Cursor::new(Vec::new());
    grid.write_to(&mut encoded, format)
        .map_err(StegError::from)
        .with_context(|| {
            format!(
                "Unable to encode target image: {}",
                dest.to_string_lossy().red().bold()
            )
        })?;

    commit_file(&dest, encoded.get_ref()).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!("{} bits stored!", stored.to_string().green().bold());
    println!(
        "The payload has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像、按所选模式提取帧并解析，
/// 文件模式下将负载写入恢复出的文件名 (或 `--output`)，消息模式下打印消息。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与模式选项的 `RecoverArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件。
/// * 图像中没有隐藏数据 (魔数不匹配) 或数据被截断。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法写入目标文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let grid = open_carrier(&args.image)?;

    let mode = if args.message {
        FrameMode::Message
    } else {
        FrameMode::File
    };

    let payload = extract(&grid, mode).with_context(|| {
        format!(
            "Failed to recover hidden data from '{}'. \nThe image may not contain a hidden payload, or was hidden in a different mode.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let dest = match (&payload.filename, args.output) {
        (_, Some(output)) => Some(output),
        (Some(name), None) => {
            println!("File name was {}", name.green().bold());
            Some(default_recover_path(&args.image, name))
        }
        (None, None) => None,
    };

    if mode == FrameMode::Message {
        println!("{}", String::from_utf8_lossy(&payload.data));
    }

    if let Some(dest) = dest {
        ensure_writable(&dest, args.force)?;

        commit_file(&dest, &payload.data).with_context(|| {
            format!(
                "Unable to write to target file: {}",
                dest.to_string_lossy().red().bold()
            )
        })?;

        println!(
            "{} bytes have been successfully recovered and saved: {}",
            payload.data.len().to_string().bold(),
            dest.to_string_lossy().green().bold()
        );
    }

    Ok(())
}

fn open_carrier(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).map_err(StegError::from).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;

    Ok(image.to_rgba8())
}

/// 先写入同目录下的临时文件，完整写入并落盘后再原子地替换 `dest`。
/// 失败时临时文件被删除，`dest` 保持原样。
fn commit_file(dest: &Path, contents: &[u8]) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(dest)?;

    Ok(())
}

fn ensure_writable(dest: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !dest.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        dest.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 帧中记录的文件名只保留最后一个路径分量。
fn payload_file_name(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .with_context(|| format!("Payload path has no file name: {}", path.to_string_lossy().red().bold()))?;

    name.to_str().map(str::to_owned).with_context(|| {
        format!(
            "Payload file name is not valid UTF-8: {}",
            name.to_string_lossy().red().bold()
        )
    })
}

/// 检查输出路径的扩展名是否为能保留 Alpha 通道的无损格式。
fn lossless_alpha_format(dest: &Path) -> Result<ImageFormat> {
    let ext = extension_of(dest);
    anyhow::ensure!(
        ext.as_deref()
            .is_some_and(|ext| LOSSLESS_ALPHA_EXTENSIONS.contains(&ext)),
        "Output image must use a lossless format with an alpha channel ({}): {}",
        LOSSLESS_ALPHA_EXTENSIONS.join(", "),
        dest.to_string_lossy().red().bold()
    );

    ImageFormat::from_path(dest).with_context(|| {
        format!(
            "Unsupported output image format: {}",
            dest.to_string_lossy().red().bold()
        )
    })
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// 生成默认的隐写输出路径：`<目录>/<图像名>.steg.<扩展名>`。
///
/// 输入格式无法保留 Alpha 通道时 (如 JPEG, BMP) 改用 PNG。
fn default_hide_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let ext = extension_of(image)
        .filter(|ext| LOSSLESS_ALPHA_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_owned());

    image.with_file_name(format!("{stem}.{STEG_SUFFIX}.{ext}"))
}

/// 生成默认的恢复路径：图像所在目录下的原始文件名。
///
/// 恢复出的文件名来自图像数据，不可信；只取最后一个路径分量，
/// 同时兼容 `/` 和 `\` 分隔符。
fn default_recover_path(image: &Path, name: &str) -> PathBuf {
    let name = name
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or(RECOVERED_FALLBACK_NAME);

    image.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hide_path_keeps_lossless_extension() {
        assert_eq!(
            default_hide_path(Path::new("dir/photo.png")),
            PathBuf::from("dir/photo.steg.png")
        );
        assert_eq!(
            default_hide_path(Path::new("scan.TIFF")),
            PathBuf::from("scan.steg.tiff")
        );
    }

    #[test]
    fn default_hide_path_falls_back_to_png() {
        assert_eq!(
            default_hide_path(Path::new("dir/mountains.jpg")),
            PathBuf::from("dir/mountains.steg.png")
        );
        assert_eq!(
            default_hide_path(Path::new("noext")),
            PathBuf::from("noext.steg.png")
        );
    }

    #[test]
    fn recover_path_strips_directories() {
        let image = Path::new("out/carrier.steg.png");
        assert_eq!(
            default_recover_path(image, "../../etc/passwd"),
            PathBuf::from("out/passwd")
        );
        assert_eq!(
            default_recover_path(image, r"C:\Users\me\notes.txt"),
            PathBuf::from("out/notes.txt")
        );
        assert_eq!(
            default_recover_path(image, ".."),
            PathBuf::from("out/recovered.bin")
        );
        assert_eq!(
            default_recover_path(image, ""),
            PathBuf::from("out/recovered.bin")
        );
    }

    #[test]
    fn commit_file_replaces_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        fs::write(&dest, b"old contents").unwrap();

        commit_file(&dest, b"new contents").unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"new contents");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn commit_file_failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("out.bin");

        assert!(commit_file(&dest, b"data").is_err());
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn lossy_destination_is_rejected() {
        assert!(lossless_alpha_format(Path::new("out.jpg")).is_err());
        assert!(lossless_alpha_format(Path::new("out.bmp")).is_err());
        assert_eq!(
            lossless_alpha_format(Path::new("out.png")).unwrap(),
            ImageFormat::Png
        );
    }
}
