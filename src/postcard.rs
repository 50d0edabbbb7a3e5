//! # 隐写编解码模块
//!
//! 把头部编解码与负载打包组合成公开操作：[`capacity`]、[`write`]、[`read_info`]、
//! [`read`] 与 [`read_with`]。
//!
//! 每次调用都按 `头部 → 负载` 的顺序线性执行。头部调用返回的游标与偏移原样交给负载调用，
//! 两次调用在载体上连续排布。所有检查都在修改像素或分配内存之前完成。

use log::{debug, trace};

use crate::allocator::{Allocator, default_allocator};
use crate::attachment::Attachment;
use crate::constants::{BITS_PER_BYTE, HEADER_SIZE, USED_CHANNELS};
use crate::error::{PostcardError, Result};
use crate::header::{PostcardHeader, PostcardInfo};
use crate::pixels::Image;
use crate::steganography::{ChannelCursor, Progress, read_bits, write_bits};

/// 图像在不计头部时最多能携带的字节数。
fn embeddable_bytes<D: AsRef<[u8]>>(image: &Image<D>) -> usize {
    image.pixel_count() * USED_CHANNELS / BITS_PER_BYTE
}

fn ensure_header_fits<D: AsRef<[u8]>>(image: &Image<D>) -> Result<()> {
    if embeddable_bytes(image) < HEADER_SIZE {
        return Err(PostcardError::ImageTooSmall {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

/// 计算图像可以携带的附件字节数。
///
/// 始终按每像素 3 个可用通道计算 (Alpha 不参与隐写)，并扣除头部占用的空间。
/// 图像连头部都放不下时返回 0。
pub fn capacity<D: AsRef<[u8]>>(image: &Image<D>) -> usize {
    embeddable_bytes(image).saturating_sub(HEADER_SIZE)
}

/// 把附件隐藏到图像中，原地修改像素缓冲区。
///
/// `info.attachment_size` 为 0 时表示不声明长度；否则必须与 `attachment` 的实际长度一致。
/// 头部中的附件长度总是取实际长度，修订号取自 `info.revision`。
///
/// # Errors
///
/// 以下情况返回错误，且不修改任何像素：
/// * 声明长度与实际长度不一致 ([`PostcardError::AttachmentSizeMismatch`])。
/// * 图像连头部都放不下 ([`PostcardError::ImageTooSmall`])。
/// * 附件超出 [`capacity`] ([`PostcardError::AttachmentTooBig`])。
pub fn write<D>(image: &mut Image<D>, info: &PostcardInfo, attachment: &[u8]) -> Result<()>
where
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    if info.attachment_size != 0 && info.attachment_size as usize != attachment.len() {
        return Err(PostcardError::AttachmentSizeMismatch {
            declared: info.attachment_size,
            actual: attachment.len(),
        });
    }

    ensure_header_fits(image)?;

    let capacity = capacity(image);
    let too_big = PostcardError::AttachmentTooBig {
        size: attachment.len(),
        capacity,
    };
    if capacity < attachment.len() {
        return Err(too_big);
    }
    let attachment_size = u32::try_from(attachment.len()).map_err(|_| too_big)?;

    let header = PostcardHeader::new(info.revision, attachment_size);
    debug!(
        "writing {attachment_size} bytes (revision {}) into {}x{} {:?} image, capacity {capacity}",
        info.revision,
        image.width(),
        image.height(),
        image.channels()
    );

    let channels = image.channels();
    let data = image.data_mut();
    let progress = write_bits(data, &header.to_bytes(), channels, ChannelCursor::start())?;
    trace!(
        "header written: {} bytes consumed, channel cursor at {}",
        progress.consumed,
        progress.cursor.channel()
    );

    let payload = write_bits(
        &mut data[progress.consumed..],
        attachment,
        channels,
        progress.cursor,
    )?;
    trace!("attachment written: {} bytes consumed", payload.consumed);

    Ok(())
}

/// 读取并校验头部，返回头部以及读取头部之后的进度。
fn read_header<D: AsRef<[u8]>>(image: &Image<D>) -> Result<(PostcardHeader, Progress)> {
    ensure_header_fits(image)?;

    let mut bytes = [0u8; HEADER_SIZE];
    let progress = read_bits(
        &mut bytes,
        image.data(),
        image.channels(),
        ChannelCursor::start(),
    )?;

    let header = PostcardHeader::from_bytes(&bytes);
    if !header.is_valid() {
        debug!("no attachment found, magic is {:#010x}", header.magic);
        return Err(PostcardError::AttachmentNotFound {
            found: header.magic,
        });
    }

    trace!(
        "header read: revision {}, {} bytes declared, {} carrier bytes consumed",
        header.revision, header.attachment_size, progress.consumed
    );
    Ok((header, progress))
}

/// 只读取头部信息，不分配内存，也不读取附件内容。
///
/// 返回的附件长度是头部中的原始值，不做进一步校验。
///
/// # Errors
///
/// * 图像连头部都放不下时返回 [`PostcardError::ImageTooSmall`]。
/// * 魔数不匹配时返回 [`PostcardError::AttachmentNotFound`]。
pub fn read_info<D: AsRef<[u8]>>(image: &Image<D>) -> Result<PostcardInfo> {
    read_header(image).map(|(header, _)| header.info())
}

/// 读取头部与附件，附件存储来自默认分配器。
///
/// # Errors
///
/// 见 [`read_with`]。
pub fn read<D: AsRef<[u8]>>(image: &Image<D>) -> Result<(PostcardInfo, Attachment<'static>)> {
    read_with(image, default_allocator())
}

/// 读取头部与附件，附件存储来自 `allocator`，并在返回的 [`Attachment`] 释放时归还。
///
/// # Errors
///
/// * 图像连头部都放不下时返回 [`PostcardError::ImageTooSmall`]。
/// * 魔数不匹配时返回 [`PostcardError::AttachmentNotFound`]，此时不会分配内存。
/// * 头部声明的长度超出 [`capacity`] 时返回 [`PostcardError::DeclaredSizeExceedsCapacity`]。
/// * 分配失败时返回 [`PostcardError::OutOfMemory`]。
pub fn read_with<'a, D: AsRef<[u8]>>(
    image: &Image<D>,
    allocator: &'a dyn Allocator,
) -> Result<(PostcardInfo, Attachment<'a>)> {
    let (header, progress) = read_header(image)?;

    let capacity = capacity(image);
    if header.attachment_size as usize > capacity {
        return Err(PostcardError::DeclaredSizeExceedsCapacity {
            declared: header.attachment_size,
            capacity,
        });
    }

    let memory = allocator.allocate(header.attachment_size as usize)?;
    let mut attachment = Attachment::from_memory(memory, allocator);
    read_bits(
        attachment.as_bytes_mut(),
        &image.data()[progress.consumed..],
        image.channels(),
        progress.cursor,
    )?;
    debug!("read {} byte attachment", attachment.len());

    Ok((header.info(), attachment))
}
