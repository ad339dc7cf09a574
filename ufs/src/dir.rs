//! # 目录项数组
//!
//! 目录的内容是其直接索引块依次拼接而成的目录项数组，`size` 恰为目录项大小的整数倍。
//! 目录项保持插入顺序，不排序；`inum == -1` 的槽位为空闲。
//!
//! 删除目录项时只在所在块内左移后续项，目录项从不跨块移动。

use alloc::vec;
use alloc::vec::Vec;

use crate::layout::{DirEntry, DiskInode};
use crate::{Error, Geometry, Result, UnixFileSystem};

/// 目录的一个数据块
#[derive(Debug)]
struct DirBlock {
    block_id: u32,
    /// 只含 `size` 范围内的目录项
    entries: Vec<DirEntry>,
    dirty: bool,
}

/// 内存中的目录：inode 与全部目录项
#[derive(Debug)]
pub(crate) struct Directory {
    inode: DiskInode,
    blocks: Vec<DirBlock>,
    per_block: usize,
}

/// 删除目录项的结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Removed {
    /// 被删除项指向的 inode
    pub inode_id: u32,
    /// 删除后变空而被归还的末尾块
    pub freed_blocks: Vec<u32>,
}

impl Directory {
    /// 经由文件读取路径读出目录的全部内容并解码
    pub fn load(fs: &UnixFileSystem, inode: DiskInode) -> Result<Self> {
        let geometry = fs.geometry();
        if !inode.is_dir() {
            return Err(Error::InvalidType);
        }
        let size = inode.size as usize;
        if size % DirEntry::SIZE != 0 {
            log::warn!("directory size {size} isn't a multiple of the entry size");
            return Err(Error::Corrupted);
        }

        let mut content = vec![0; size];
        fs.read_data(&inode, &mut content);

        let blocks = content
            .chunks(geometry.block_size)
            .zip(&inode.direct)
            .map(|(chunk, &block_id)| {
                if block_id == 0 {
                    log::warn!("directory has a hole inside its entry array");
                    return Err(Error::Corrupted);
                }
                Ok(DirBlock {
                    block_id,
                    entries: chunk.chunks_exact(DirEntry::SIZE).map(DirEntry::decode).collect(),
                    dirty: false,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            inode,
            blocks,
            per_block: geometry.entries_per_block(),
        })
    }

    /// 新目录的首块："." 指向自身，".." 指向父目录，其余槽位空闲
    pub fn init_block(geometry: &Geometry, inode_id: u32, parent_id: u32) -> Vec<u8> {
        let entries = [DirEntry::new(".", inode_id), DirEntry::new("..", parent_id)];
        Self::encode_block(geometry.block_size, &entries)
    }

    #[cfg(test)]
    pub fn inode(&self) -> &DiskInode {
        &self.inode
    }

    /// 按块序、块内序排列的全部槽位，包括空闲槽位
    pub fn entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.blocks.iter().flat_map(|block| &block.entries)
    }

    /// 有效目录项
    pub fn live(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries().filter(|entry| !entry.is_free())
    }

    /// 第一个同名的有效目录项所指向的 inode
    pub fn find(&self, name: &str) -> Option<u32> {
        self.live()
            .find(|entry| entry.name_bytes() == name.as_bytes())
            .and_then(DirEntry::inode)
    }

    /// 除 "." 与 ".." 之外没有有效目录项
    pub fn is_empty(&self) -> bool {
        self.live().all(DirEntry::is_dot)
    }

    /// 插入目录项：优先复用空闲槽位，否则追加到末尾。
    ///
    /// 末尾块已满时调用 `alloc_block` 取得新块；直接索引用尽或分配失败时
    /// 返回 [`Error::NotEnoughSpace`]，此时目录保持不变。
    pub fn insert(
        &mut self,
        entry: DirEntry,
        alloc_block: impl FnOnce() -> Option<u32>,
    ) -> Result<()> {
        for block in &mut self.blocks {
            if let Some(slot) = block.entries.iter_mut().find(|slot| slot.is_free()) {
                *slot = entry;
                block.dirty = true;
                return Ok(());
            }
        }

        let full = self
            .blocks
            .last()
            .map_or(true, |block| block.entries.len() == self.per_block);
        if full {
            if self.blocks.len() == self.inode.direct.len() {
                return Err(Error::NotEnoughSpace);
            }
            let block_id = alloc_block().ok_or(Error::NotEnoughSpace)?;
            log::debug!("directory grows into block {block_id}");
            self.inode.direct[self.blocks.len()] = block_id;
            self.blocks.push(DirBlock {
                block_id,
                entries: Vec::with_capacity(self.per_block),
                dirty: true,
            });
        }

        let last = self.blocks.last_mut().ok_or(Error::Corrupted)?;
        last.entries.push(entry);
        last.dirty = true;
        self.inode.size += DirEntry::SIZE as u32;
        Ok(())
    }

    /// 删除第一个同名的有效目录项，块内后续项左移一格，块尾空出的槽位标记为空闲。
    ///
    /// 随后截去目录末尾的空闲槽位：目录随之缩小，末尾块因此变空则归还该块，
    /// 直到末尾块以有效目录项结尾。末尾块之外的空闲槽位保留，大小不变。
    pub fn remove(&mut self, name: &str) -> Option<Removed> {
        let (block_index, slot) = self.blocks.iter().enumerate().find_map(|(i, block)| {
            block
                .entries
                .iter()
                .position(|entry| !entry.is_free() && entry.name_bytes() == name.as_bytes())
                .map(|slot| (i, slot))
        })?;

        let block = &mut self.blocks[block_index];
        let removed = block.entries.remove(slot);
        block.entries.push(DirEntry::free());
        block.dirty = true;

        let freed_blocks = self.trim_tail();
        removed.inode().map(|inode_id| Removed {
            inode_id,
            freed_blocks,
        })
    }

    /// 截去末尾的空闲槽位，返回因此变空的块
    fn trim_tail(&mut self) -> Vec<u32> {
        let mut freed = Vec::new();
        while let Some(last) = self.blocks.last_mut() {
            while last.entries.last().is_some_and(DirEntry::is_free) {
                last.entries.pop();
                last.dirty = true;
                self.inode.size -= DirEntry::SIZE as u32;
            }
            if !last.entries.is_empty() {
                break;
            }
            freed.push(last.block_id);
            self.inode.direct[self.blocks.len() - 1] = 0;
            self.blocks.pop();
        }
        freed
    }

    /// 写回修改过的块，返回更新后的 inode；inode 本身由调用者写回
    pub fn store(self, fs: &UnixFileSystem) -> DiskInode {
        let block_size = fs.geometry().block_size;
        for block in self.blocks.iter().filter(|block| block.dirty) {
            fs.write_block(block.block_id, &Self::encode_block(block_size, &block.entries));
        }
        self.inode
    }

    fn encode_block(block_size: usize, entries: &[DirEntry]) -> Vec<u8> {
        let mut buf = vec![0; block_size];
        let free = DirEntry::free();
        for (i, slot) in buf.chunks_exact_mut(DirEntry::SIZE).enumerate() {
            entries.get(i).unwrap_or(&free).encode(slot);
        }
        buf
    }
}
