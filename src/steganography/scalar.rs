//! 逐比特的标量打包器，是向量化路径的参照实现，也负责处理其余下的部分。

use super::{ChannelCursor, Progress, required_span};
use crate::constants::{BITS_PER_BYTE, LSB_CLEAR_MASK, LSB_KEEP_MASK};
use crate::error::Result;
use crate::pixels::Channels;

/// 将 `source` 的每个比特 (最低位优先) 写入 `target` 中连续通道字节的最低位。
///
/// 通道字节的高 7 位保持不变；RGBA 缓冲区的 Alpha 字节被跳过。
/// 返回新的游标以及消耗的 `target` 字节数，调用方可以从下一个未使用的字节继续写入。
///
/// # Errors
///
/// `target` 长度不足时返回 [`crate::PostcardError::CarrierExhausted`]，不修改任何字节。
pub fn write_bits(
    target: &mut [u8],
    source: &[u8],
    channels: Channels,
    cursor: ChannelCursor,
) -> Result<Progress> {
    required_span(target.len(), channels, cursor, source.len())?;

    let mut cursor = cursor;
    let mut index = 0;
    for &byte in source {
        for bit in 0..BITS_PER_BYTE {
            index += cursor.advance(channels);
            target[index] = (target[index] & LSB_CLEAR_MASK) | ((byte >> bit) & LSB_KEEP_MASK);
            index += 1;
        }
    }

    Ok(Progress {
        cursor,
        consumed: index,
    })
}

/// 从 `source` 的通道最低位还原出 `target.len()` 个字节，比特顺序与 [`write_bits`] 互逆。
///
/// 返回新的游标以及消耗的 `source` 字节数。
///
/// # Errors
///
/// `source` 长度不足时返回 [`crate::PostcardError::CarrierExhausted`]。
pub fn read_bits(
    target: &mut [u8],
    source: &[u8],
    channels: Channels,
    cursor: ChannelCursor,
) -> Result<Progress> {
    required_span(source.len(), channels, cursor, target.len())?;

    let mut cursor = cursor;
    let mut index = 0;
    for byte in target.iter_mut() {
        let mut value = 0u8;
        for bit in 0..BITS_PER_BYTE {
            index += cursor.advance(channels);
            value |= (source[index] & LSB_KEEP_MASK) << bit;
            index += 1;
        }
        *byte = value;
    }

    Ok(Progress {
        cursor,
        consumed: index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_bit_lands_in_first_channel() {
        let mut target = [0u8; 8];
        write_bits(&mut target, &[0b0000_0001], Channels::Rgb, ChannelCursor::start()).unwrap();
        assert_eq!(target, [1, 0, 0, 0, 0, 0, 0, 0]);

        let mut target = [0u8; 8];
        write_bits(&mut target, &[0b1000_0000], Channels::Rgb, ChannelCursor::start()).unwrap();
        assert_eq!(target, [0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn upper_bits_are_preserved() {
        let mut target = [0xFFu8; 8];
        write_bits(&mut target, &[0b0101_0101], Channels::Rgb, ChannelCursor::start()).unwrap();
        assert_eq!(target, [0xFF, 0xFE, 0xFF, 0xFE, 0xFF, 0xFE, 0xFF, 0xFE]);
    }

    #[test]
    fn alpha_bytes_are_skipped() {
        let mut target = [0x80u8; 11];
        let progress =
            write_bits(&mut target, &[0xFF], Channels::Rgba, ChannelCursor::start()).unwrap();

        assert_eq!(
            target,
            [0x81, 0x81, 0x81, 0x80, 0x81, 0x81, 0x81, 0x80, 0x81, 0x81, 0x80]
        );
        assert_eq!(progress.consumed, 10);
        assert_eq!(progress.cursor.channel(), 2);
    }

    #[test]
    fn cursor_at_alpha_skips_before_writing() {
        let mut target = [0u8; 11];
        let cursor = ChannelCursor { channel: 3 };
        let progress = write_bits(&mut target, &[0xFF], Channels::Rgba, cursor).unwrap();

        assert_eq!(target, [0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1]);
        assert_eq!(progress.consumed, 11);
        assert_eq!(progress.cursor.channel(), 2);
    }

    #[test]
    fn cursor_at_alpha_needs_the_extra_byte() {
        let mut target = [0u8; 10];
        let cursor = ChannelCursor { channel: 3 };
        assert_eq!(
            write_bits(&mut target, &[0xFF], Channels::Rgba, cursor).unwrap_err(),
            crate::PostcardError::CarrierExhausted {
                required: 11,
                available: 10
            }
        );
        assert_eq!(target, [0u8; 10]);
    }

    #[test]
    fn read_reassembles_lsb_first() {
        let source = [1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        let mut target = [0u8; 2];
        let progress =
            read_bits(&mut target, &source, Channels::Rgb, ChannelCursor::start()).unwrap();

        assert_eq!(target, [0x01, 0x80]);
        assert_eq!(progress.consumed, 16);
    }

    #[test]
    fn read_inverts_write_for_both_layouts() {
        let payload = b"lsb postcard";
        for channels in [Channels::Rgb, Channels::Rgba] {
            let mut carrier: Vec<u8> = (0..200u32).map(|value| (value * 7) as u8).collect();
            let written =
                write_bits(&mut carrier, payload, channels, ChannelCursor::start()).unwrap();

            let mut recovered = [0u8; 12];
            let read =
                read_bits(&mut recovered, &carrier, channels, ChannelCursor::start()).unwrap();

            assert_eq!(&recovered, payload);
            assert_eq!(read, written);
        }
    }
}
