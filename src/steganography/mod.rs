//! # 比特打包引擎
//!
//! 把字节流拆成单个比特，逐一写入通道字节的最低有效位，以及相反的还原过程。
//! 对 RGBA 缓冲区会跳过每个像素的 Alpha 通道；跳过进度由 [`ChannelCursor`] 记录，
//! 并作为返回值在多次调用之间传递，使头部与负载的两次写入如同一条连续的比特流。
//!
//! 比特顺序固定为最低位优先：源字节的第 0 位写入第一个通道，第 7 位写入第八个通道。
//!
//! 启用 `simd` 特性时，按批对齐的前缀交给 [`vector`] 处理，余下部分由 [`scalar`] 完成；
//! 两条路径的输出逐字节一致。

pub mod scalar;
pub mod vector;

use crate::constants::{BITS_PER_BYTE, VECTOR_ALIGNMENT};
use crate::error::{PostcardError, Result};
use crate::pixels::Channels;

/// Alpha 在像素中的位置。
const ALPHA_POSITION: u8 = 3;

/// 当前像素中已经使用过的通道数 (0..=3)。
///
/// 仅在 RGBA 缓冲区上有意义；RGB 缓冲区不跳过任何通道，游标保持不变。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCursor {
    channel: u8,
}

impl ChannelCursor {
    /// 位于像素起点的游标。
    pub const fn start() -> Self {
        Self { channel: 0 }
    }

    pub fn channel(self) -> u8 {
        self.channel
    }

    /// 前进到下一个可用通道，返回在此之前需要跳过的字节数 (0 或 1)。
    #[inline]
    fn advance(&mut self, channels: Channels) -> usize {
        if !channels.has_alpha() {
            return 0;
        }

        let skipped = if self.channel == ALPHA_POSITION {
            self.channel = 0;
            1
        } else {
            0
        };
        self.channel += 1;
        skipped
    }

    /// 从当前位置开始存取 `bits` 个比特需要覆盖的字节数，以及之后的游标。
    pub fn span(self, channels: Channels, bits: usize) -> (usize, ChannelCursor) {
        if !channels.has_alpha() || bits == 0 {
            return (bits, self);
        }

        let position = self.channel as usize + bits - 1;
        let skipped = position / 3;
        let cursor = ChannelCursor {
            channel: (position % 3) as u8 + 1,
        };
        (bits + skipped, cursor)
    }
}

/// 一次打包调用之后的状态：新的通道游标以及消耗的载体字节数。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub cursor: ChannelCursor,
    pub consumed: usize,
}

impl Progress {
    /// 尚未消耗任何字节的状态。
    pub const fn at(cursor: ChannelCursor) -> Self {
        Self {
            cursor,
            consumed: 0,
        }
    }

    /// 把紧随其后的另一次调用的进度累加进来。
    pub fn then(self, next: Progress) -> Self {
        Self {
            cursor: next.cursor,
            consumed: self.consumed + next.consumed,
        }
    }
}

/// 检查载体区域是否足够，返回需要覆盖的字节数。
fn required_span(
    available: usize,
    channels: Channels,
    cursor: ChannelCursor,
    bytes: usize,
) -> Result<usize> {
    let bits = bytes
        .checked_mul(BITS_PER_BYTE)
        .ok_or(PostcardError::CarrierExhausted {
            required: usize::MAX,
            available,
        })?;
    let (required, _) = cursor.span(channels, bits);
    if required > available {
        return Err(PostcardError::CarrierExhausted {
            required,
            available,
        });
    }
    Ok(required)
}

/// 向量化路径可以处理的前缀长度。
fn batched_len(len: usize) -> usize {
    len - len % VECTOR_ALIGNMENT
}

/// 把 `source` 的全部比特写入 `target` 的通道最低位。
///
/// 启用 `simd` 特性时，对齐的前缀交给 [`vector::write_bits`]，余下部分交给
/// [`scalar::write_bits`]，并沿用前者返回的游标与偏移。
///
/// # Errors
///
/// `target` 不足以容纳全部比特时返回 [`PostcardError::CarrierExhausted`]，此时不修改任何字节。
pub fn write_bits(
    target: &mut [u8],
    source: &[u8],
    channels: Channels,
    cursor: ChannelCursor,
) -> Result<Progress> {
    required_span(target.len(), channels, cursor, source.len())?;

    let mut progress = Progress::at(cursor);
    let mut source = source;

    if cfg!(feature = "simd") {
        let batched = batched_len(source.len());
        if batched > 0 {
            let (head, tail) = source.split_at(batched);
            progress = vector::write_bits(target, head, channels, cursor)?;
            source = tail;
        }
    }

    if !source.is_empty() {
        let rest = scalar::write_bits(
            &mut target[progress.consumed..],
            source,
            channels,
            progress.cursor,
        )?;
        progress = progress.then(rest);
    }

    Ok(progress)
}

/// 从 `source` 的通道最低位还原出 `target.len()` 个字节。
///
/// 只有 RGB 缓冲区会走向量化路径；RGBA 的 Alpha 跳跃与批宽度无法对齐，始终使用标量路径。
///
/// # Errors
///
/// `source` 不足以提供全部比特时返回 [`PostcardError::CarrierExhausted`]。
pub fn read_bits(
    target: &mut [u8],
    source: &[u8],
    channels: Channels,
    cursor: ChannelCursor,
) -> Result<Progress> {
    required_span(source.len(), channels, cursor, target.len())?;

    let mut progress = Progress::at(cursor);
    let mut target = target;

    if cfg!(feature = "simd") && channels == Channels::Rgb {
        let batched = batched_len(target.len());
        if batched > 0 {
            let (head, tail) = std::mem::take(&mut target).split_at_mut(batched);
            progress = vector::read_bits(head, source, channels, cursor)?;
            target = tail;
        }
    }

    if !target.is_empty() {
        let rest = scalar::read_bits(
            target,
            &source[progress.consumed..],
            channels,
            progress.cursor,
        )?;
        progress = progress.then(rest);
    }

    Ok(progress)
}
