//! # alpha_steg 库
//!
//! 本库包含 Alpha 通道隐写工具的核心逻辑。

// 声明库包含的所有模块。

pub mod bits;
pub mod cli;
pub mod constants;
pub mod error;
pub mod frame;
pub mod handler;
pub mod steganography;

pub use error::StegError;
pub use frame::{FrameBuffer, FrameHeader, FrameMode, Payload};
