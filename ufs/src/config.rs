use crate::layout::DirEntry;
use crate::{Error, Result};

/// 块大小与直接索引个数：二者决定了 inode 记录的大小与单文件容量上限，
/// 打开和格式化文件系统时都要给出，且必须与镜像制作时一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub block_size: usize,
    /// 每个 inode 内直接索引块的个数
    pub direct_ptrs: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(4096, 30)
    }
}

impl Geometry {
    #[inline]
    pub const fn new(block_size: usize, direct_ptrs: usize) -> Self {
        Self {
            block_size,
            direct_ptrs,
        }
    }

    /// 类型、大小各占 4 字节，其后是直接索引
    #[inline]
    pub const fn inode_size(&self) -> usize {
        8 + 4 * self.direct_ptrs
    }

    #[inline]
    pub const fn inodes_per_block(&self) -> usize {
        self.block_size / self.inode_size()
    }

    #[inline]
    pub const fn entries_per_block(&self) -> usize {
        self.block_size / DirEntry::SIZE
    }

    #[inline]
    pub const fn max_file_size(&self) -> usize {
        self.direct_ptrs * self.block_size
    }

    #[inline]
    pub const fn bits_per_block(&self) -> usize {
        self.block_size * 8
    }

    /// 容纳 `size` 字节需要多少个数据块
    #[inline]
    pub const fn blocks_for(&self, size: usize) -> usize {
        size.div_ceil(self.block_size)
    }

    pub fn validate(&self) -> Result<()> {
        // 超级块占 40 字节，目录块须恰好装下整数个目录项
        if self.block_size < 64
            || self.block_size % DirEntry::SIZE != 0
            || self.direct_ptrs == 0
            || self.inode_size() > self.block_size
        {
            return Err(Error::InvalidSize);
        }
        Ok(())
    }
}
