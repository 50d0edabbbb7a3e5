//! # lsb_postcard 库
//!
//! 在已解码的原始 RGB/RGBA 像素缓冲区的最低有效位中隐藏一段字节附件，并在之后恢复它。
//! 图像文件格式的编解码不在本库范围内，调用方只需提供像素数据与尺寸信息。
//!
//! ```
//! use lsb_postcard::{Image, PostcardInfo, read, write};
//!
//! let mut image = Image::new(16, 16, 4, vec![0x80u8; 16 * 16 * 4])?;
//! let info = PostcardInfo { revision: 7, attachment_size: 0 };
//! write(&mut image, &info, b"hidden")?;
//!
//! let (info, attachment) = read(&image)?;
//! assert_eq!(info.revision, 7);
//! assert_eq!(&*attachment, b"hidden");
//! # Ok::<(), lsb_postcard::PostcardError>(())
//! ```

// 声明库包含的所有模块。

pub mod allocator;
pub mod attachment;
pub mod cli;
pub mod constants;
pub mod error;
pub mod handler;
pub mod header;
pub mod pixels;
pub mod postcard;
pub mod steganography;

pub use allocator::{Allocator, Memory, SystemAllocator, default_allocator};
pub use attachment::Attachment;
pub use error::{PostcardError, Result};
pub use header::{PostcardHeader, PostcardInfo};
pub use pixels::{Channels, Image};
pub use postcard::{capacity, read, read_info, read_with, write};
