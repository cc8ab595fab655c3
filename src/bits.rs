//! # 位编解码
//!
//! 字节与位序列之间的转换。字节内的位顺序固定为低位在前 (bit 0 .. bit 7)，
//! 嵌入与提取必须使用同一顺序。

use crate::constants::BITS_PER_BYTE;
use crate::error::{Result, StegError};

/// 将一个字节拆成 8 个布尔值，下标 `i` 对应第 `i` 位 (0 为最低有效位)。
pub fn byte_to_bits(byte: u8) -> [bool; 8] {
    std::array::from_fn(|i| (byte >> i) & 1 == 1)
}

/// [`byte_to_bits`] 的逆运算。
///
/// # Errors
///
/// 输入不是恰好 8 个布尔值时返回 [`StegError::InvalidArgument`]。
pub fn bits_to_byte(bits: &[bool]) -> Result<u8> {
    if bits.len() != BITS_PER_BYTE {
        return Err(StegError::InvalidArgument(format!(
            "expected {} bits, got {}",
            BITS_PER_BYTE,
            bits.len()
        )));
    }

    Ok(bits
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i)))
}

/// 按嵌入顺序逐位遍历一段字节。
pub struct BitCursor<'a> {
    bytes: &'a [u8],
    byte_index: usize,
    bit_index: usize,
}

impl<'a> BitCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            byte_index: 0,
            bit_index: 0,
        }
    }

    /// 尚未取出的位数。
    pub fn remaining(&self) -> usize {
        (self.bytes.len() - self.byte_index) * BITS_PER_BYTE - self.bit_index
    }
}

impl Iterator for BitCursor<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let byte = *self.bytes.get(self.byte_index)?;
        let bit = (byte >> self.bit_index) & 1 == 1;

        self.bit_index += 1;
        if self.bit_index == BITS_PER_BYTE {
            self.bit_index = 0;
            self.byte_index += 1;
        }

        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BitCursor<'_> {}

/// 逐位收集，每满 8 位组装出一个字节。
#[derive(Debug, Default)]
pub struct ByteAssembler {
    pending: [bool; 8],
    filled: usize,
}

impl ByteAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 压入一位；凑满一个字节时返回该字节。
    pub fn push(&mut self, bit: bool) -> Result<Option<u8>> {
        self.pending[self.filled] = bit;
        self.filled += 1;

        if self.filled < BITS_PER_BYTE {
            return Ok(None);
        }

        self.filled = 0;
        bits_to_byte(&self.pending).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_to_bits_is_lsb_first() {
        assert_eq!(
            byte_to_bits(0b0000_0001),
            [true, false, false, false, false, false, false, false]
        );
        assert_eq!(
            byte_to_bits(0x48),
            [false, false, false, true, false, false, true, false]
        );
    }

    #[test]
    fn bits_to_byte_inverts_every_value() {
        for byte in 0..=u8::MAX {
            assert_eq!(bits_to_byte(&byte_to_bits(byte)).unwrap(), byte);
        }
    }

    #[test]
    fn bits_to_byte_rejects_wrong_count() {
        let err = bits_to_byte(&[true; 7]).unwrap_err();
        assert!(matches!(err, StegError::InvalidArgument(_)));
        assert!(bits_to_byte(&[false; 9]).is_err());
    }

    #[test]
    fn cursor_walks_bytes_in_order() {
        let bytes = [0x01, 0x80];
        let bits: Vec<bool> = BitCursor::new(&bytes).collect();

        assert_eq!(bits.len(), 16);
        assert!(bits[0]);
        assert!(bits[1..15].iter().all(|&b| !b));
        assert!(bits[15]);
    }

    #[test]
    fn cursor_reports_remaining() {
        let bytes = [0xff, 0x00, 0x0f];
        let mut cursor = BitCursor::new(&bytes);
        assert_eq!(cursor.len(), 24);

        cursor.by_ref().take(10).for_each(drop);
        assert_eq!(cursor.remaining(), 14);
    }

    #[test]
    fn assembler_emits_one_byte_per_eight_bits() {
        let mut assembler = ByteAssembler::new();
        let out: Vec<u8> = BitCursor::new(b"STEG")
            .filter_map(|bit| assembler.push(bit).unwrap())
            .collect();

        assert_eq!(out, b"STEG");
    }
}
