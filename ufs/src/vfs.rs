//! # 对外操作层
//!
//! 以 inode 编号与名字为参数的文件系统操作。每个操作都重新读取超级块与位图；
//! 修改类操作先在内存中完成全部分配，确认空间足够后才开始写盘，
//! 因此参数错误与空间不足都不会留下部分修改。

use alloc::vec;
use alloc::vec::Vec;

use crate::dir::Directory;
use crate::layout::{DirEntry, DiskInode, InodeKind, SuperBlock};
use crate::{Bitmap, Error, Result, UnixFileSystem, ROOT_INODE};

impl UnixFileSystem {
    /// 在目录 `parent` 下按名字查找，返回目录项指向的 inode 编号
    pub fn lookup(&self, parent: u32, name: &str) -> Result<u32> {
        let sb = self.read_super_block()?;
        let inode_bitmap = self.read_bitmap(sb.inode_bitmap, sb.num_inodes);
        self.open_dir(&sb, &inode_bitmap, parent)?
            .find(name)
            .ok_or(Error::NotFound)
    }

    /// 读出文件开头的 `buf.len()` 字节(不超过文件大小)，返回读出的字节数
    pub fn read(&self, inode_id: u32, buf: &mut [u8]) -> Result<usize> {
        if buf.len() > self.geometry().max_file_size() {
            return Err(Error::InvalidSize);
        }
        let sb = self.read_super_block()?;
        let inode_bitmap = self.read_bitmap(sb.inode_bitmap, sb.num_inodes);
        let inode = self.load_inode(&sb, &inode_bitmap, inode_id)?;
        Ok(self.read_data(&inode, buf))
    }

    /// 以 `data` 整体覆盖普通文件的内容，返回写入的字节数。
    ///
    /// 文件原有的数据块先全部归还，再按首次适配分配新块，旧块可能被重新用上。
    pub fn write(&self, inode_id: u32, data: &[u8]) -> Result<usize> {
        let sb = self.read_super_block()?;
        let inode_bitmap = self.read_bitmap(sb.inode_bitmap, sb.num_inodes);
        let mut inode = self.load_inode(&sb, &inode_bitmap, inode_id)?;
        if data.len() > self.geometry().max_file_size() {
            return Err(Error::InvalidSize);
        }
        if !inode.is_file() {
            return Err(Error::InvalidType);
        }

        let geometry = *self.geometry();
        let mut data_bitmap = self.read_bitmap(sb.data_bitmap, sb.num_data);
        for block_id in inode.data_blocks(&geometry) {
            Self::release(&sb, &mut data_bitmap, block_id);
        }
        let blocks = (0..geometry.blocks_for(data.len()))
            .map(|_| data_bitmap.alloc().map(|index| sb.data_block(index)))
            .collect::<Option<Vec<_>>>()
            .ok_or(Error::NotEnoughSpace)?;
        log::debug!("inode {inode_id}: {} bytes into blocks {blocks:?}", data.len());

        for (chunk, &block_id) in data.chunks(geometry.block_size).zip(&blocks) {
            let mut block = vec![0; geometry.block_size];
            block[..chunk.len()].copy_from_slice(chunk);
            self.write_block(block_id, &block);
        }

        inode.direct.fill(0);
        inode.direct[..blocks.len()].copy_from_slice(&blocks);
        inode.size = data.len() as u32;
        self.write_inode(&sb, inode_id, &inode)?;
        self.write_bitmap(sb.data_bitmap, &data_bitmap);

        Ok(data.len())
    }

    /// 在目录 `parent` 下创建名为 `name` 的文件或目录，返回新 inode 的编号。
    ///
    /// 同名项已存在时：类型相同则直接返回其编号，否则返回 [`Error::InvalidType`]。
    pub fn create(&self, parent: u32, kind: InodeKind, name: &str) -> Result<u32> {
        let sb = self.read_super_block()?;
        let mut inode_bitmap = self.read_bitmap(sb.inode_bitmap, sb.num_inodes);
        if !inode_bitmap.is_allocated(parent) {
            return Err(Error::InvalidInode);
        }
        DirEntry::validate_name(name)?;

        let mut dir = self.open_dir(&sb, &inode_bitmap, parent)?;
        if let Some(existing) = dir.find(name) {
            let inode = self.read_inode(&sb, existing)?;
            return if inode.kind == kind {
                Ok(existing)
            } else {
                Err(Error::InvalidType)
            };
        }

        // 所有分配都在内存中完成，任何一步空间不足都不会写盘
        let geometry = *self.geometry();
        let mut data_bitmap = self.read_bitmap(sb.data_bitmap, sb.num_data);
        let inode_id = inode_bitmap.alloc().ok_or(Error::NotEnoughSpace)?;
        let mut inode = DiskInode::new(kind, &geometry);
        if kind == InodeKind::Directory {
            let block_id = sb.data_block(data_bitmap.alloc().ok_or(Error::NotEnoughSpace)?);
            inode.size = 2 * DirEntry::SIZE as u32;
            inode.direct[0] = block_id;
        }
        dir.insert(DirEntry::new(name, inode_id), || {
            data_bitmap.alloc().map(|index| sb.data_block(index))
        })?;
        log::debug!("create {kind:?} {name:?} as inode {inode_id} under {parent}");

        if inode.is_dir() {
            self.write_block(
                inode.direct[0],
                &Directory::init_block(&geometry, inode_id, parent),
            );
        }
        self.write_inode(&sb, inode_id, &inode)?;
        let parent_inode = dir.store(self);
        self.write_inode(&sb, parent, &parent_inode)?;
        self.write_bitmap(sb.inode_bitmap, &inode_bitmap);
        self.write_bitmap(sb.data_bitmap, &data_bitmap);

        Ok(inode_id)
    }

    /// 删除目录 `parent` 下名为 `name` 的项，并归还其 inode 与数据块。
    /// 目录只有在除 "." 与 ".." 外别无他项时才能删除。
    pub fn unlink(&self, parent: u32, name: &str) -> Result<()> {
        let sb = self.read_super_block()?;
        let mut inode_bitmap = self.read_bitmap(sb.inode_bitmap, sb.num_inodes);
        let mut dir = self.open_dir(&sb, &inode_bitmap, parent)?;
        if name == "." || name == ".." {
            return Err(Error::InvalidName);
        }

        let target_id = dir.find(name).ok_or(Error::NotFound)?;
        let target = self.load_inode(&sb, &inode_bitmap, target_id)?;
        let geometry = *self.geometry();
        let target_blocks: Vec<u32> = target.data_blocks(&geometry).collect();
        if target.is_dir() && !Directory::load(self, target)?.is_empty() {
            return Err(Error::NotEmpty);
        }

        let mut data_bitmap = self.read_bitmap(sb.data_bitmap, sb.num_data);
        let removed = dir.remove(name).ok_or(Error::NotFound)?;
        for &block_id in &removed.freed_blocks {
            Self::release(&sb, &mut data_bitmap, block_id);
        }
        inode_bitmap.dealloc(target_id);
        for block_id in target_blocks {
            Self::release(&sb, &mut data_bitmap, block_id);
        }
        log::debug!("unlink {name:?} (inode {}) under {parent}", removed.inode_id);

        let parent_inode = dir.store(self);
        self.write_inode(&sb, parent, &parent_inode)?;
        self.write_bitmap(sb.inode_bitmap, &inode_bitmap);
        self.write_bitmap(sb.data_bitmap, &data_bitmap);

        Ok(())
    }

    /// 目录下的全部有效目录项，按磁盘上的顺序排列
    pub fn read_dir(&self, inode_id: u32) -> Result<Vec<DirEntry>> {
        let sb = self.read_super_block()?;
        let inode_bitmap = self.read_bitmap(sb.inode_bitmap, sb.num_inodes);
        let dir = self.open_dir(&sb, &inode_bitmap, inode_id)?;
        Ok(dir.live().cloned().collect())
    }

    /// 从根目录出发解析以 `/` 分隔的路径，空的路径分量被忽略
    pub fn resolve(&self, path: &str) -> Result<u32> {
        path.split('/')
            .filter(|cmp| !cmp.is_empty())
            .try_fold(ROOT_INODE, |inode_id, cmp| self.lookup(inode_id, cmp))
    }
}

impl UnixFileSystem {
    /// 读入已分配的目录；不是目录则返回 [`Error::InvalidType`]
    fn open_dir(
        &self,
        sb: &SuperBlock,
        inode_bitmap: &Bitmap,
        inode_id: u32,
    ) -> Result<Directory> {
        let inode = self.load_inode(sb, inode_bitmap, inode_id)?;
        Directory::load(self, inode)
    }

    /// 在数据块位图中归还一个绝对块号
    fn release(sb: &SuperBlock, data_bitmap: &mut Bitmap, block_id: u32) {
        if let Some(index) = sb.data_index(block_id) {
            log::debug!("free data block {block_id}");
            data_bitmap.dealloc(index);
        }
    }
}
