//! 按批处理的打包器。
//!
//! 写入时每次取一个 16 位字，把它的每个比特展开到一个字节通道 (0x00 或 0x01)，
//! 再与目标通道字节清零后的最低位合并。读取时每次把 32 个通道字节的最低位收拢成 4 个字节。
//! 展开与收拢使用 64/128 位整数上的 SWAR 运算；在 x86_64 上改用 SSE 指令完成 RGB 批处理。
//!
//! 与 [`super::scalar`] 的输出逐字节一致。长度为
//! [`VECTOR_ALIGNMENT`](crate::constants::VECTOR_ALIGNMENT) 整数倍的前缀按批处理，
//! 不足一批的尾部交给标量路径。

use super::{ChannelCursor, Progress, batched_len, required_span, scalar};
use crate::constants::{
    BITS_PER_BYTE, LSB_CLEAR_MASK, READ_BATCH_BYTES, READ_BATCH_LANES, WRITE_BATCH_BYTES,
    WRITE_BATCH_LANES,
};
use crate::error::Result;
use crate::pixels::Channels;

/// 每个字节通道的最低位。
const LANE_ONES: u64 = 0x0101_0101_0101_0101;
/// 第 i 个字节通道只保留第 i 位。
const LANE_SELECT: u64 = 0x8040_2010_0804_0201;
/// 每个字节通道的低 7 位。
const LANE_LOW_SEVEN: u64 = 0x7F7F_7F7F_7F7F_7F7F;
/// 把 8 个通道最低位收拢到最高字节 (第 i 个通道 → 第 i 位)。
#[cfg_attr(all(target_arch = "x86_64", not(test)), allow(dead_code))]
const LANE_GATHER: u64 = 0x0102_0408_1020_4080;

const LANE_CLEAR: u128 = u128::from_le_bytes([LSB_CLEAR_MASK; WRITE_BATCH_LANES]);

/// 把一个字节展开成 8 个字节通道，第 i 个通道为第 i 位的值 (0 或 1)。
#[inline]
fn spread_byte(byte: u8) -> u64 {
    let selected = (byte as u64).wrapping_mul(LANE_ONES) & LANE_SELECT;
    // 非零通道的第 7 位置 1，再移到第 0 位。
    ((((selected & LANE_LOW_SEVEN) + LANE_LOW_SEVEN) | selected) >> 7) & LANE_ONES
}

/// 把一个 16 位字展开成 16 个字节通道。
#[inline]
fn spread_word(word: u16) -> u128 {
    let [low, high] = word.to_le_bytes();
    spread_byte(low) as u128 | ((spread_byte(high) as u128) << 64)
}

/// 收拢 8 个通道字节的最低位。
#[cfg_attr(all(target_arch = "x86_64", not(test)), allow(dead_code))]
#[inline]
fn gather_byte(lanes: [u8; BITS_PER_BYTE]) -> u8 {
    ((u64::from_le_bytes(lanes) & LANE_ONES).wrapping_mul(LANE_GATHER) >> 56) as u8
}

/// 批量写入 `source` 的全部比特，语义与 [`scalar::write_bits`] 相同。
///
/// RGB 缓冲区上每批直接覆盖 16 个连续通道字节；RGBA 缓冲区上展开后的比特
/// 逐个放入通道并跳过 Alpha。未对齐的尾部由 [`scalar::write_bits`] 接着写入。
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

    let (head, tail) = source.split_at(batched_len(source.len()));
    let progress = match channels {
        Channels::Rgb => {
            let consumed = head.len() * BITS_PER_BYTE;
            write_rgb(&mut target[..consumed], head);
            Progress { cursor, consumed }
        }
        Channels::Rgba => write_rgba(target, head, cursor),
    };

    let rest = scalar::write_bits(
        &mut target[progress.consumed..],
        tail,
        channels,
        progress.cursor,
    )?;
    Ok(progress.then(rest))
}

fn write_rgb(target: &mut [u8], source: &[u8]) {
    #[cfg(target_arch = "x86_64")]
    if std::arch::is_x86_feature_detected!("ssse3") {
        // SAFETY: 已在运行时确认 CPU 支持 SSSE3。
        unsafe { write_rgb_ssse3(target, source) };
        return;
    }

    write_rgb_swar(target, source);
}

fn write_rgb_swar(target: &mut [u8], source: &[u8]) {
    for (word, lanes) in source
        .chunks_exact(WRITE_BATCH_BYTES)
        .zip(target.chunks_exact_mut(WRITE_BATCH_LANES))
    {
        let bits = spread_word(u16::from_le_bytes([word[0], word[1]]));
        let mut pixels = [0u8; WRITE_BATCH_LANES];
        pixels.copy_from_slice(lanes);
        let blended = (u128::from_le_bytes(pixels) & LANE_CLEAR) | bits;
        lanes.copy_from_slice(&blended.to_le_bytes());
    }
}

fn write_rgba(target: &mut [u8], source: &[u8], cursor: ChannelCursor) -> Progress {
    let mut cursor = cursor;
    let mut index = 0;
    for word in source.chunks_exact(WRITE_BATCH_BYTES) {
        let bits = spread_word(u16::from_le_bytes([word[0], word[1]])).to_le_bytes();
        for bit in bits {
            index += cursor.advance(Channels::Rgba);
            target[index] = (target[index] & LSB_CLEAR_MASK) | bit;
            index += 1;
        }
    }

    Progress {
        cursor,
        consumed: index,
    }
}

/// 批量还原 `target.len()` 个字节，语义与 [`scalar::read_bits`] 相同。
///
/// 只对 RGB 缓冲区的对齐前缀分批处理；尾部与 RGBA 缓冲区交给标量路径。
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
    if channels.has_alpha() {
        return scalar::read_bits(target, source, channels, cursor);
    }

    required_span(source.len(), channels, cursor, target.len())?;

    let batched = batched_len(target.len());
    let (head, tail) = target.split_at_mut(batched);
    let consumed = batched * BITS_PER_BYTE;
    read_rgb(head, &source[..consumed]);

    let rest = scalar::read_bits(tail, &source[consumed..], channels, cursor)?;
    Ok(Progress { cursor, consumed }.then(rest))
}

fn read_rgb(target: &mut [u8], source: &[u8]) {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: SSE2 是 x86_64 的基础指令集。
        unsafe { read_rgb_sse2(target, source) }
    }

    #[cfg(not(target_arch = "x86_64"))]
    read_rgb_swar(target, source);
}

#[cfg_attr(all(target_arch = "x86_64", not(test)), allow(dead_code))]
fn read_rgb_swar(target: &mut [u8], source: &[u8]) {
    for (bytes, lanes) in target
        .chunks_exact_mut(READ_BATCH_BYTES)
        .zip(source.chunks_exact(READ_BATCH_LANES))
    {
        for (byte, group) in bytes.iter_mut().zip(lanes.chunks_exact(BITS_PER_BYTE)) {
            let mut channels = [0u8; BITS_PER_BYTE];
            channels.copy_from_slice(group);
            *byte = gather_byte(channels);
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn write_rgb_ssse3(target: &mut [u8], source: &[u8]) {
    use std::arch::x86_64::*;

    unsafe {
        // 低字节复制到前 8 个通道，高字节复制到后 8 个通道。
        let copy_mask = _mm_setr_epi8(0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1);
        let select_mask = _mm_setr_epi8(
            0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, i8::MIN, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20,
            0x40, i8::MIN,
        );
        let clear_mask = _mm_set1_epi8(LSB_CLEAR_MASK as i8);
        let keep_mask = _mm_set1_epi8(1);

        for (word, lanes) in source
            .chunks_exact(WRITE_BATCH_BYTES)
            .zip(target.chunks_exact_mut(WRITE_BATCH_LANES))
        {
            let word = u16::from_le_bytes([word[0], word[1]]);
            let mut bits = _mm_set1_epi16(word as i16);
            bits = _mm_shuffle_epi8(bits, copy_mask);
            bits = _mm_and_si128(bits, select_mask);
            bits = _mm_cmpeq_epi8(bits, select_mask);
            bits = _mm_and_si128(bits, keep_mask);

            let ptr = lanes.as_mut_ptr() as *mut __m128i;
            let pixels = _mm_and_si128(_mm_loadu_si128(ptr), clear_mask);
            _mm_storeu_si128(ptr, _mm_or_si128(pixels, bits));
        }
    }
}

#[cfg(target_arch = "x86_64")]
unsafe fn read_rgb_sse2(target: &mut [u8], source: &[u8]) {
    use std::arch::x86_64::*;

    unsafe {
        let keep_mask = _mm_set1_epi8(1);

        for (bytes, lanes) in target
            .chunks_exact_mut(READ_BATCH_BYTES)
            .zip(source.chunks_exact(READ_BATCH_LANES))
        {
            let ptr = lanes.as_ptr() as *const __m128i;
            let low = _mm_cmpeq_epi8(_mm_and_si128(_mm_loadu_si128(ptr), keep_mask), keep_mask);
            let high = _mm_cmpeq_epi8(
                _mm_and_si128(_mm_loadu_si128(ptr.add(1)), keep_mask),
                keep_mask,
            );

            let low = (_mm_movemask_epi8(low) as u16).to_le_bytes();
            let high = (_mm_movemask_epi8(high) as u16).to_le_bytes();
            bytes.copy_from_slice(&[low[0], low[1], high[0], high[1]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_byte_places_bit_i_in_lane_i() {
        for byte in 0..=255u8 {
            let lanes = spread_byte(byte).to_le_bytes();
            for (bit, lane) in lanes.iter().enumerate() {
                assert_eq!(*lane, (byte >> bit) & 1, "byte {byte:#04x}, bit {bit}");
            }
        }
    }

    #[test]
    fn gather_byte_inverts_spread_byte() {
        for byte in 0..=255u8 {
            let mut lanes = spread_byte(byte).to_le_bytes();
            // 高位噪声不影响结果。
            for lane in lanes.iter_mut() {
                *lane |= 0xA4;
            }
            assert_eq!(gather_byte(lanes), byte);
        }
    }

    #[test]
    fn matches_scalar_write_for_both_layouts() {
        let source: Vec<u8> = (0..64u32).map(|value| (value * 29 + 3) as u8).collect();
        for channels in [Channels::Rgb, Channels::Rgba] {
            for start in 0..=3u8 {
                let cursor = match channels {
                    Channels::Rgb => ChannelCursor::start(),
                    Channels::Rgba => ChannelCursor { channel: start },
                };
                let carrier: Vec<u8> = (0..800u32).map(|value| (value * 13) as u8).collect();
                let mut batched = carrier.clone();
                let mut reference = carrier;

                let a = write_bits(&mut batched, &source, channels, cursor).unwrap();
                let b = scalar::write_bits(&mut reference, &source, channels, cursor).unwrap();

                assert_eq!(batched, reference, "{channels:?} from channel {start}");
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn matches_scalar_read_for_rgb() {
        let carrier: Vec<u8> = (0..512u32).map(|value| (value * 101 + 7) as u8).collect();
        let mut batched = [0u8; 64];
        let mut reference = [0u8; 64];

        let a = read_bits(&mut batched, &carrier, Channels::Rgb, ChannelCursor::start()).unwrap();
        let b =
            scalar::read_bits(&mut reference, &carrier, Channels::Rgb, ChannelCursor::start())
                .unwrap();

        assert_eq!(batched, reference);
        assert_eq!(a, b);
    }

    #[test]
    fn unaligned_lengths_match_scalar() {
        let carrier: Vec<u8> = (0..128u32).map(|value| (value * 71 + 5) as u8).collect();
        for len in [1usize, 2, 3, 5, 6] {
            let source: Vec<u8> = (0..len as u32).map(|value| (value * 97 + 0x3C) as u8).collect();

            for channels in [Channels::Rgb, Channels::Rgba] {
                let cursor = match channels {
                    Channels::Rgb => ChannelCursor::start(),
                    Channels::Rgba => ChannelCursor { channel: 3 },
                };
                let mut batched = carrier.clone();
                let mut reference = carrier.clone();
                let a = write_bits(&mut batched, &source, channels, cursor).unwrap();
                let b = scalar::write_bits(&mut reference, &source, channels, cursor).unwrap();
                assert_eq!(batched, reference, "write {len} bytes, {channels:?}");
                assert_eq!(a, b);
            }

            let mut batched = vec![0u8; len];
            let mut reference = vec![0u8; len];
            let a = read_bits(&mut batched, &carrier, Channels::Rgb, ChannelCursor::start()).unwrap();
            let b = scalar::read_bits(&mut reference, &carrier, Channels::Rgb, ChannelCursor::start())
                .unwrap();
            assert_eq!(batched, reference, "read {len} bytes");
            assert_eq!(a, b);
        }
    }

    #[test]
    fn all_ones_survive_an_unaligned_round_trip() {
        let mut carrier = [0u8; 64];
        let progress =
            write_bits(&mut carrier, &[0xFF; 3], Channels::Rgb, ChannelCursor::start()).unwrap();
        assert_eq!(progress.consumed, 24);
        assert_eq!(carrier.iter().filter(|&&byte| byte == 1).count(), 24);

        let mut recovered = [0u8; 3];
        read_bits(&mut recovered, &[1u8; 64], Channels::Rgb, ChannelCursor::start()).unwrap();
        assert_eq!(recovered, [0xFF; 3]);
    }

    #[test]
    fn swar_kernels_match_scalar() {
        let source: Vec<u8> = (0..32u32).map(|value| (value * 53 + 11) as u8).collect();
        let carrier: Vec<u8> = (0..256u32).map(|value| (value * 17) as u8).collect();

        let mut swar = carrier.clone();
        let mut reference = carrier;
        write_rgb_swar(&mut swar, &source);
        scalar::write_bits(&mut reference, &source, Channels::Rgb, ChannelCursor::start()).unwrap();
        assert_eq!(swar, reference);

        let mut recovered = [0u8; 32];
        read_rgb_swar(&mut recovered, &swar);
        assert_eq!(recovered.as_slice(), source.as_slice());
    }

    #[test]
    fn rgba_read_falls_back_to_scalar() {
        let carrier: Vec<u8> = (0..128u32).map(|value| (value * 5) as u8).collect();
        let cursor = ChannelCursor { channel: 2 };
        let mut batched = [0u8; 8];
        let mut reference = [0u8; 8];

        let a = read_bits(&mut batched, &carrier, Channels::Rgba, cursor).unwrap();
        let b = scalar::read_bits(&mut reference, &carrier, Channels::Rgba, cursor).unwrap();

        assert_eq!(batched, reference);
        assert_eq!(a, b);
    }
}
