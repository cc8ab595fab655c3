/// 帧头部的魔数，标记图像中存在隐藏数据。
pub const MAGIC: &[u8; 4] = b"STEG";

/// 用于嵌入数据的 Alpha 通道位 (0 为最低有效位)。
/// 每个像素只携带 1 bit，因此图像容量 = 宽 × 高 (bits)。
pub const DESIGNATED_BIT: u8 = 3;

/// 文件模式的帧头大小 (字节)：魔数 + 文件名长度 + 负载长度。
pub const FILE_HEADER_SIZE: usize = 12;

/// 消息模式的帧头大小 (字节)：魔数 + 负载长度。
pub const MESSAGE_HEADER_SIZE: usize = 8;

pub const BITS_PER_BYTE: usize = 8;

/// 默认输出文件名中插入的后缀，如 `photo.png` -> `photo.steg.png`。
pub const STEG_SUFFIX: &str = "steg";

/// 能无损保留 Alpha 通道的输出格式扩展名。
pub const LOSSLESS_ALPHA_EXTENSIONS: &[&str] = &["png", "tiff", "tif", "webp", "qoi"];

/// 输入格式无法保留 Alpha 时使用的输出扩展名。
pub const FALLBACK_EXTENSION: &str = "png";
