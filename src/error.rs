//! # 错误模型模块
//!
//! 用单一的 `PostcardError` 枚举承载隐写编解码的所有失败分支，
//! 调用方可按分支匹配，`thiserror` 负责生成可读的错误信息。

/// 隐写编解码错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostcardError {
    /// 附件超出了图像的容量，在修改任何像素之前返回。
    #[error("attachment of {size} bytes does not fit, capacity is {capacity} bytes")]
    AttachmentTooBig { size: usize, capacity: usize },

    /// 头部魔数不匹配，图像中没有附件。
    #[error("no attachment found (magic {found:#010x})")]
    AttachmentNotFound { found: u32 },

    /// 图像太小，连头部都无法容纳。
    #[error("image of {width}x{height} pixels is too small to carry a header")]
    ImageTooSmall { width: u32, height: u32 },

    /// 仅支持 3 (RGB) 与 4 (RGBA) 通道。
    #[error("unsupported channel count: {0}")]
    UnsupportedChannelCount(u8),

    /// 像素缓冲区长度与宽、高、通道数不一致。
    #[error("pixel buffer holds {actual} bytes, dimensions require {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// `PostcardInfo` 中声明的附件长度与实际附件长度不一致。
    #[error("declared attachment size {declared} does not match actual size {actual}")]
    AttachmentSizeMismatch { declared: u32, actual: usize },

    /// 头部声明的附件长度超出了该图像可能携带的容量。
    #[error("header declares {declared} bytes, but the image can only carry {capacity}")]
    DeclaredSizeExceedsCapacity { declared: u32, capacity: usize },

    /// 比特打包器的目标或来源区域不足以容纳请求的比特数。
    #[error("carrier region of {available} bytes is too short, {required} bytes are needed")]
    CarrierExhausted { required: usize, available: usize },

    /// 分配器无法提供所需的内存。
    #[error("out of memory while allocating {size} bytes")]
    OutOfMemory { size: usize },
}

/// 本库统一使用的 `Result` 别名。
pub type Result<T> = std::result::Result<T, PostcardError>;
