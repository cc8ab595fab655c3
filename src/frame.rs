//! # 帧格式
//!
//! 隐藏在像素中的数据单元：
//!
//! ```text
//! 文件模式:  "STEG" | name_len (u32 LE) | payload_len (u32 LE) | 文件名 (UTF-8) | 负载
//! 消息模式:  "STEG" | payload_len (u32 LE) | 负载
//! ```
//!
//! 两种帧共用同一魔数，格式中没有模式标记，解码方必须自行选择模式。

use crate::constants::{BITS_PER_BYTE, FILE_HEADER_SIZE, MAGIC, MESSAGE_HEADER_SIZE};
use crate::error::{Result, StegError};

/// 帧的形状。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// 12 字节头部，携带原始文件名。
    File,
    /// 8 字节头部，仅携带负载。
    Message,
}

impl FrameMode {
    pub fn header_size(self) -> usize {
        match self {
            FrameMode::File => FILE_HEADER_SIZE,
            FrameMode::Message => MESSAGE_HEADER_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// 文件名的字节数；消息模式下为 `None`。
    pub name_length: Option<u32>,
    pub payload_length: u32,
}

impl FrameHeader {
    pub fn mode(&self) -> FrameMode {
        match self.name_length {
            Some(_) => FrameMode::File,
            None => FrameMode::Message,
        }
    }

    pub fn size(&self) -> usize {
        self.mode().header_size()
    }

    /// 整个帧 (头部 + 文件名 + 负载) 的字节数。
    pub fn frame_len(&self) -> u64 {
        self.size() as u64
            + u64::from(self.name_length.unwrap_or(0))
            + u64::from(self.payload_length)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = Vec::with_capacity(self.size());
        header.extend_from_slice(MAGIC);
        if let Some(name_length) = self.name_length {
            header.extend_from_slice(&name_length.to_le_bytes());
        }
        header.extend_from_slice(&self.payload_length.to_le_bytes());
        header
    }

    /// 从帧的开头解析头部。
    ///
    /// # Errors
    ///
    /// * 前 4 字节不是魔数时返回 [`StegError::MagicMismatch`]。
    /// * 字节数不足一个头部时返回 [`StegError::TruncatedPayload`]。
    pub fn parse(bytes: &[u8], mode: FrameMode) -> Result<Self> {
        check_magic(bytes)?;

        let size = mode.header_size();
        if bytes.len() < size {
            return Err(StegError::TruncatedPayload {
                expected: size as u64,
                recovered: bytes.len() as u64,
            });
        }

        let header = match mode {
            FrameMode::File => FrameHeader {
                name_length: Some(read_u32_le(&bytes[4..8])),
                payload_length: read_u32_le(&bytes[8..12]),
            },
            FrameMode::Message => FrameHeader {
                name_length: None,
                payload_length: read_u32_le(&bytes[4..8]),
            },
        };

        Ok(header)
    }
}

/// 检查帧开头的魔数，只需要前 4 个字节。
///
/// # Errors
///
/// * 前 4 字节不是魔数时返回 [`StegError::MagicMismatch`]。
/// * 不足 4 字节时返回 [`StegError::TruncatedPayload`]。
pub fn check_magic(bytes: &[u8]) -> Result<()> {
    let Some(magic) = bytes.get(..MAGIC.len()) else {
        return Err(StegError::TruncatedPayload {
            expected: MAGIC.len() as u64,
            recovered: bytes.len() as u64,
        });
    };

    if magic != MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(StegError::MagicMismatch { found });
    }

    Ok(())
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

fn length_field(field: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| StegError::PayloadTooLarge { field, len })
}

/// 已组装好的帧，构造后不可变。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: Vec<u8>,
}

impl FrameBuffer {
    /// 组装帧。`filename` 为 `Some` 时使用文件模式，否则使用消息模式。
    ///
    /// # Errors
    ///
    /// 文件名或负载长度超出 `u32` 范围时返回 [`StegError::PayloadTooLarge`]。
    pub fn build(payload: &[u8], filename: Option<&str>) -> Result<Self> {
        let header = FrameHeader {
            name_length: filename
                .map(|name| length_field("file name", name.len()))
                .transpose()?,
            payload_length: length_field("payload", payload.len())?,
        };

        let name = filename.map(str::as_bytes).unwrap_or_default();
        let mut bytes = header.to_bytes();
        bytes.reserve(name.len() + payload.len());
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(payload);

        log::debug!(
            "built {:?} frame: {} header + {} name + {} payload bytes",
            header.mode(),
            header.size(),
            name.len(),
            payload.len()
        );

        Ok(Self { bytes })
    }

    pub(crate) fn from_raw(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 嵌入该帧所需的位数。
    pub fn bit_len(&self) -> u64 {
        self.bytes.len() as u64 * BITS_PER_BYTE as u64
    }

    /// 拆出文件名与负载。
    pub fn parse(&self, mode: FrameMode) -> Result<Payload> {
        parse(&self.bytes, mode)
    }
}

/// 从帧中恢复出的内容。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    /// 文件模式下的原始文件名；消息模式下为 `None`。
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// 解析完整的帧字节。
///
/// # Errors
///
/// * 魔数不匹配时返回 [`StegError::MagicMismatch`]。
/// * 字节数少于头部声明的帧长度时返回 [`StegError::TruncatedPayload`]。
/// * 文件名不是合法 UTF-8 时返回 [`StegError::InvalidEncoding`]。
pub fn parse(bytes: &[u8], mode: FrameMode) -> Result<Payload> {
    let header = FrameHeader::parse(bytes, mode)?;
    let truncated = || StegError::TruncatedPayload {
        expected: header.frame_len(),
        recovered: bytes.len() as u64,
    };

    let name_end =
        section_end(header.size(), header.name_length.unwrap_or(0)).ok_or_else(truncated)?;
    let payload_end =
        section_end(name_end, header.payload_length).ok_or_else(truncated)?;
    let (name, data) = bytes
        .get(header.size()..payload_end)
        .ok_or_else(truncated)?
        .split_at(name_end - header.size());

    let filename = match header.name_length {
        Some(_) => Some(std::str::from_utf8(name)?.to_owned()),
        None => None,
    };

    Ok(Payload {
        filename,
        data: data.to_vec(),
    })
}

/// `start + len`；在 `usize` 放不下时返回 `None`。
fn section_end(start: usize, len: u32) -> Option<usize> {
    usize::try_from(len).ok()?.checked_add(start)
}
