//! # 内存分配抽象模块
//!
//! `read` 通过注入的 [`Allocator`] 为附件申请存储，调用方可以替换成自己的实现。
//! 不提供分配器时使用基于系统堆的全局实例 [`default_allocator`]。

use crate::error::{PostcardError, Result};

/// 由分配器交出的一段已归零的内存。
pub type Memory = Box<[u8]>;

/// 附件存储的分配能力。
///
/// 实现需保证 `deallocate` 能接收自己 `allocate` 产生的任何内存。
/// 编解码器本身每次 `read` 最多调用一次 `allocate`，不要求实现线程安全以外的任何约束。
pub trait Allocator: Send + Sync {
    /// 分配 `size` 字节。
    ///
    /// # Errors
    ///
    /// 无法满足请求时返回 [`PostcardError::OutOfMemory`]。
    fn allocate(&self, size: usize) -> Result<Memory>;

    /// 归还之前分配的内存。
    fn deallocate(&self, memory: Memory);
}

/// 基于系统堆的分配器。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Result<Memory> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| PostcardError::OutOfMemory { size })?;
        buffer.resize(size, 0);
        Ok(buffer.into_boxed_slice())
    }

    fn deallocate(&self, memory: Memory) {
        drop(memory);
    }
}

static SYSTEM_ALLOCATOR: SystemAllocator = SystemAllocator;

/// 进程级默认分配器，无需初始化，永不销毁。
pub fn default_allocator() -> &'static dyn Allocator {
    &SYSTEM_ALLOCATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_allocator_returns_zeroed_memory() {
        let memory = default_allocator().allocate(17).unwrap();
        assert_eq!(memory.len(), 17);
        assert!(memory.iter().all(|&byte| byte == 0));
        default_allocator().deallocate(memory);
    }

    #[test]
    fn impossible_request_reports_out_of_memory() {
        let err = SystemAllocator.allocate(usize::MAX).unwrap_err();
        assert_eq!(err, PostcardError::OutOfMemory { size: usize::MAX });
    }
}
