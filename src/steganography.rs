//! # 像素嵌入引擎
//!
//! 每个像素的 Alpha 通道第 [`DESIGNATED_BIT`] 位携带 1 bit 帧数据。
//! 遍历顺序为按列扫描：外层 x ∈ [0, width)，内层 y ∈ [0, height)。
//! 嵌入和提取必须使用相同的顺序。

use crate::bits::{BitCursor, ByteAssembler};
use crate::constants::{BITS_PER_BYTE, DESIGNATED_BIT, MAGIC};
use crate::error::{Result, StegError};
use crate::frame::{self, FrameBuffer, FrameHeader, FrameMode, Payload};
use image::RgbaImage;

const CHANNELS: usize = 4;
const ALPHA: usize = 3;
const MASK: u8 = 1 << DESIGNATED_BIT;

/// 图像能容纳的位数 (每个像素 1 bit)。
pub fn capacity(grid: &RgbaImage) -> u64 {
    u64::from(grid.width()) * u64::from(grid.height())
}

/// 按遍历顺序产出每个像素 Alpha 字节在原始缓冲区中的下标。
fn alpha_indices(width: u32, height: u32) -> impl Iterator<Item = usize> {
    let (width, height) = (width as usize, height as usize);
    (0..width).flat_map(move |x| (0..height).map(move |y| (y * width + x) * CHANNELS + ALPHA))
}

/// 将帧逐位写入图像。
///
/// 只修改 Alpha 通道的指定位；写完最后一位即停止，其余像素保持不变。
///
/// # Returns
///
/// 实际写入的位数。
///
/// # Errors
///
/// 图像像素数少于帧所需位数时返回 [`StegError::InsufficientCapacity`]，
/// 此时图像不会被修改。
pub fn embed(grid: &mut RgbaImage, frame: &FrameBuffer) -> Result<u64> {
    let required = frame.bit_len();
    let available = capacity(grid);
    if required > available {
        return Err(StegError::InsufficientCapacity {
            required,
            available,
        });
    }

    let (width, height) = grid.dimensions();
    let pixels: &mut [u8] = grid;
    let mut stored = 0u64;

    for (index, bit) in alpha_indices(width, height).zip(BitCursor::new(frame.as_bytes())) {
        let alpha = &mut pixels[index];
        *alpha = if bit { *alpha | MASK } else { *alpha & !MASK };
        stored += 1;
    }

    log::debug!("embedded {stored} bits into a {width}x{height} grid");
    Ok(stored)
}

/// 按嵌入顺序读取帧字节，直到头部声明的长度满足为止。
///
/// # Errors
///
/// * 头部魔数不匹配时返回 [`StegError::MagicMismatch`]，不再继续读取。
/// * 图像在帧读完之前耗尽，或头部声明的长度超出图像容量时，
///   返回 [`StegError::TruncatedPayload`]。
pub fn extract_frame(grid: &RgbaImage, mode: FrameMode) -> Result<FrameBuffer> {
    let (width, height) = grid.dimensions();
    let pixels: &[u8] = grid;
    let header_size = mode.header_size();

    let mut assembler = ByteAssembler::new();
    let mut buf = Vec::with_capacity(header_size);
    let mut expected: Option<u64> = None;

    for index in alpha_indices(width, height) {
        let Some(byte) = assembler.push(pixels[index] & MASK != 0)? else {
            continue;
        };
        buf.push(byte);

        if buf.len() == MAGIC.len() {
            frame::check_magic(&buf)?;
        }

        if expected.is_none() && buf.len() == header_size {
            let header = FrameHeader::parse(&buf, mode)?;
            let frame_len = header.frame_len();
            log::debug!("found {mode:?} header, frame is {frame_len} bytes");

            if frame_len * BITS_PER_BYTE as u64 > capacity(grid) {
                return Err(StegError::TruncatedPayload {
                    expected: frame_len,
                    recovered: buf.len() as u64,
                });
            }
            // 上面的容量检查保证 frame_len 不超过像素数，转换为 usize 不会截断。
            buf.reserve(frame_len as usize - buf.len());
            expected = Some(frame_len);
        }

        if expected == Some(buf.len() as u64) {
            return Ok(FrameBuffer::from_raw(buf));
        }
    }

    Err(StegError::TruncatedPayload {
        expected: expected.unwrap_or(header_size as u64),
        recovered: buf.len() as u64,
    })
}

/// 提取并解析图像中隐藏的内容。
pub fn extract(grid: &RgbaImage, mode: FrameMode) -> Result<Payload> {
    let frame = extract_frame(grid, mode)?;
    frame::parse(frame.as_bytes(), mode)
}
