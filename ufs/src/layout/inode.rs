//! 磁盘上的 inode 记录
//!
//! | type: i32 | size: i32 | direct: [u32; D] |
//!
//! 只有直接索引，没有间接索引块，单文件容量为 `direct_ptrs * block_size`。
//! 目录的空间用于存放目录项数组；
//! 文件的空间用于存放它的数据。

use alloc::vec;
use alloc::vec::Vec;

use super::{get_i32, get_u32, put_i32, put_u32, SuperBlock};
use crate::{Error, Geometry, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    #[default]
    Directory,
    File,
}

impl TryFrom<i32> for InodeKind {
    type Error = Error;

    fn try_from(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Directory),
            1 => Ok(Self::File),
            _ => Err(Error::InvalidType),
        }
    }
}

impl From<InodeKind> for i32 {
    fn from(kind: InodeKind) -> Self {
        match kind {
            InodeKind::Directory => 0,
            InodeKind::File => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInode {
    pub kind: InodeKind,
    /// 字节数
    pub size: u32,
    /// 直接索引块的绝对块号，0 表示未使用
    pub direct: Vec<u32>,
}

impl DiskInode {
    #[inline]
    pub fn new(kind: InodeKind, geometry: &Geometry) -> Self {
        Self {
            kind,
            size: 0,
            direct: vec![0; geometry.direct_ptrs],
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == InodeKind::File
    }

    pub fn decode(buf: &[u8], geometry: &Geometry) -> Result<Self> {
        let kind = InodeKind::try_from(get_i32(buf, 0)).map_err(|_| {
            log::warn!("unknown inode type {}", get_i32(buf, 0));
            Error::Corrupted
        })?;
        let size = u32::try_from(get_i32(buf, 4))
            .ok()
            .filter(|&size| size as usize <= geometry.max_file_size())
            .ok_or_else(|| {
                log::warn!("inode size {} out of range", get_i32(buf, 4));
                Error::Corrupted
            })?;
        let direct = (0..geometry.direct_ptrs)
            .map(|i| get_u32(buf, 8 + i * 4))
            .collect();

        Ok(Self { kind, size, direct })
    }

    pub fn encode(&self, buf: &mut [u8]) {
        put_i32(buf, 0, self.kind.into());
        put_i32(buf, 4, self.size as i32);
        for (i, &block_id) in self.direct.iter().enumerate() {
            put_u32(buf, 8 + i * 4, block_id);
        }
    }

    /// 容纳当前大小所需的直接索引个数
    #[inline]
    pub fn block_count(&self, geometry: &Geometry) -> usize {
        geometry.blocks_for(self.size as usize)
    }

    /// 当前大小范围内、实际指向数据块的直接索引
    pub fn data_blocks<'a>(&'a self, geometry: &Geometry) -> impl Iterator<Item = u32> + 'a {
        self.direct[..self.block_count(geometry)]
            .iter()
            .copied()
            .filter(|&block_id| block_id != 0)
    }

    /// 所用的直接索引都必须落在数据区之内
    pub fn check(&self, sb: &SuperBlock, geometry: &Geometry) -> Result<()> {
        match self
            .data_blocks(geometry)
            .find(|&block_id| sb.data_index(block_id).is_none())
        {
            Some(block_id) => {
                log::warn!("direct pointer {block_id} lies outside the data region");
                Err(Error::Corrupted)
            }
            None => Ok(()),
        }
    }
}
