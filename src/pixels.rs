//! # 像素缓冲区模块
//!
//! 描述隐写载体：已解码的原始 RGB/RGBA 像素数据及其尺寸信息。
//! 本库不负责任何图像文件格式的编解码。

use crate::error::{PostcardError, Result};

/// 每个像素的通道布局。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// 红、绿、蓝三个通道。
    Rgb,
    /// 红、绿、蓝加 Alpha，Alpha 通道不参与隐写。
    Rgba,
}

impl Channels {
    /// 每个像素占用的字节数。
    pub const fn count(self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }

    /// 是否存在需要跳过的 Alpha 通道。
    pub const fn has_alpha(self) -> bool {
        matches!(self, Channels::Rgba)
    }
}

impl TryFrom<u8> for Channels {
    type Error = PostcardError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            other => Err(PostcardError::UnsupportedChannelCount(other)),
        }
    }
}

/// 隐写载体：按行优先、像素内通道交错排列的像素缓冲区。
///
/// 缓冲区由调用方持有，`write` 会原地修改它，`read` 与 `read_info` 只读取。
/// 构造时即校验通道数与缓冲区长度，之后的所有操作都可以依赖这一不变量。
#[derive(Debug)]
pub struct Image<D> {
    width: u32,
    height: u32,
    channels: Channels,
    data: D,
}

impl<D: AsRef<[u8]>> Image<D> {
    /// 创建像素缓冲区视图。
    ///
    /// # Errors
    ///
    /// * 通道数不是 3 或 4 时返回 [`PostcardError::UnsupportedChannelCount`]。
    /// * 缓冲区长度不等于 `width * height * channels` 时返回
    ///   [`PostcardError::BufferSizeMismatch`]。
    pub fn new(width: u32, height: u32, channels: u8, data: D) -> Result<Self> {
        let channels = Channels::try_from(channels)?;
        let actual = data.as_ref().len();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels.count()))
            .ok_or(PostcardError::BufferSizeMismatch {
                expected: usize::MAX,
                actual,
            })?;

        if expected != actual {
            return Err(PostcardError::BufferSizeMismatch { expected, actual });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// 像素总数。
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl<D: AsRef<[u8]> + AsMut<[u8]>> Image<D> {
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_channel_counts() {
        for channels in [0u8, 1, 2, 5] {
            let data = vec![0u8; 4 * channels as usize];
            assert_eq!(
                Image::new(2, 2, channels, data).unwrap_err(),
                PostcardError::UnsupportedChannelCount(channels)
            );
        }
    }

    #[test]
    fn rejects_mismatched_buffer_length() {
        let err = Image::new(4, 4, 3, vec![0u8; 47]).unwrap_err();
        assert_eq!(
            err,
            PostcardError::BufferSizeMismatch {
                expected: 48,
                actual: 47
            }
        );
    }

    #[test]
    fn accepts_borrowed_and_owned_storage() {
        let mut owned = vec![0u8; 2 * 3 * 4];
        let image = Image::new(2, 3, 4, owned.as_slice()).unwrap();
        assert_eq!(image.channels(), Channels::Rgba);
        assert_eq!(image.pixel_count(), 6);

        let mut image = Image::new(2, 3, 4, owned.as_mut_slice()).unwrap();
        image.data_mut()[0] = 7;
        assert_eq!(owned[0], 7);
    }
}
