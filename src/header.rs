//! # 隐写头部模块
//!
//! 头部是写入载体的前 [`HEADER_SIZE`] 个字节，作为不透明的字节序列经过比特打包器。
//! 所有字段均以小端字节序排列。

use crate::constants::{HEADER_SIZE, POSTCARD_MAGIC};

/// 隐写内容的描述信息：调用方定义的修订号与附件长度。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostcardInfo {
    pub revision: u16,
    pub attachment_size: u32,
}

/// 载体中的固定格式头部。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostcardHeader {
    pub magic: u32,
    pub reserved: u16,
    pub revision: u16,
    pub attachment_size: u32,
}

impl PostcardHeader {
    pub fn new(revision: u16, attachment_size: u32) -> Self {
        Self {
            magic: POSTCARD_MAGIC,
            reserved: 0,
            revision,
            attachment_size,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == POSTCARD_MAGIC
    }

    pub fn info(&self) -> PostcardInfo {
        PostcardInfo {
            revision: self.revision,
            attachment_size: self.attachment_size,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.reserved.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.revision.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.attachment_size.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            reserved: u16::from_le_bytes([bytes[4], bytes[5]]),
            revision: u16::from_le_bytes([bytes[6], bytes[7]]),
            attachment_size: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_is_ispc_stored_little_endian() {
        let bytes = PostcardHeader::new(7, 4).to_bytes();
        assert_eq!(&bytes[0..4], b"CPSI");
        assert_eq!(&bytes[6..8], &[7, 0]);
        assert_eq!(&bytes[8..12], &[4, 0, 0, 0]);
    }

    #[test]
    fn reserved_field_survives_serialization() {
        let mut header = PostcardHeader::new(0x1234, 0xDEAD_BEEF);
        header.reserved = 0xA55A;
        let parsed = PostcardHeader::from_bytes(&header.to_bytes());
        assert_eq!(parsed, header);
        assert!(parsed.is_valid());
        assert_eq!(
            parsed.info(),
            PostcardInfo {
                revision: 0x1234,
                attachment_size: 0xDEAD_BEEF
            }
        );
    }

    #[test]
    fn zeroed_bytes_are_not_a_header() {
        assert!(!PostcardHeader::from_bytes(&[0u8; HEADER_SIZE]).is_valid());
    }
}
