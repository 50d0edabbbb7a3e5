//! # 附件模块
//!
//! [`Attachment`] 是隐藏在载体中的字节负载的所有权包装。
//! 它只能移动，不能复制；离开作用域时把存储归还给产生它的分配器，且只归还一次。
//! 借用形式的附件就是普通的 `&[u8]`。

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::allocator::{Allocator, Memory, default_allocator};
use crate::error::Result;

/// 拥有所有权的附件缓冲区。
pub struct Attachment<'a> {
    allocator: &'a dyn Allocator,
    memory: Option<Memory>,
}

impl Attachment<'static> {
    /// 空附件，绑定默认分配器。
    pub fn new() -> Self {
        Self {
            allocator: default_allocator(),
            memory: None,
        }
    }

    /// 从借用的数据复制出一个附件，存储来自默认分配器。
    ///
    /// # Errors
    ///
    /// 分配失败时返回 [`crate::PostcardError::OutOfMemory`]。
    pub fn from_data(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::new());
        }

        let allocator = default_allocator();
        let mut memory = allocator.allocate(data.len())?;
        memory.copy_from_slice(data);
        Ok(Self {
            allocator,
            memory: Some(memory),
        })
    }
}

impl<'a> Attachment<'a> {
    /// 接管由 `allocator` 分配的内存。
    pub fn from_memory(memory: Memory, allocator: &'a dyn Allocator) -> Self {
        Self {
            allocator,
            memory: Some(memory),
        }
    }

    /// 交出存储及其分配器，不再负责释放；由调用方稍后调用 [`Allocator::deallocate`]。
    ///
    /// 空附件交出一段零长度的内存。
    pub fn into_memory(mut self) -> (Memory, &'a dyn Allocator) {
        let memory = self.memory.take().unwrap_or_default();
        (memory, self.allocator)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.memory.as_deref().unwrap_or(&[])
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.memory.as_deref_mut().unwrap_or(&mut [])
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl Default for Attachment<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Attachment<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl DerefMut for Attachment<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_bytes_mut()
    }
}

impl AsRef<[u8]> for Attachment<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Attachment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Attachment<'_> {
    fn drop(&mut self) {
        if let Some(memory) = self.memory.take() {
            self.allocator.deallocate(memory);
        }
    }
}
