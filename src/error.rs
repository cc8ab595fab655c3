//! # 错误类型
//!
//! 核心模块 (`bits`, `frame`, `steganography`) 统一返回 [`StegError`]，
//! 命令层再用 `anyhow` 附加上下文。

use std::str::Utf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StegError {
    #[error("Magic not found: expected \"STEG\", found {found:02x?}")]
    MagicMismatch { found: [u8; 4] },

    #[error("Not enough space in the image: required {required} bits, available {available} bits")]
    InsufficientCapacity { required: u64, available: u64 },

    #[error("Hidden payload is truncated: expected {expected} bytes, recovered {recovered} bytes")]
    TruncatedPayload { expected: u64, recovered: u64 },

    #[error("The {field} length {len} does not fit in a 32-bit field")]
    PayloadTooLarge { field: &'static str, len: usize },

    #[error("Embedded file name is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] Utf8Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Image error: {0}")]
    ImageIo(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, StegError>;
