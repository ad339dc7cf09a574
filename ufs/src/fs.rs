//! # 文件系统层
//!
//! 读取磁盘布局并在其上存取 inode 与位图。
//!
//! 除块设备引用与几何参数外不保存任何状态：每次操作都重新读取超级块与位图，
//! 修改内存中的拷贝后整块写回。

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::dir::Directory;
use crate::layout::*;
use crate::{Error, Geometry, Result, ROOT_INODE};

pub struct UnixFileSystem {
    block_device: Arc<dyn BlockDevice>,
    geometry: Geometry,
}

impl UnixFileSystem {
    /// 打开已格式化的设备，校验超级块描述的布局
    pub fn open(block_device: Arc<dyn BlockDevice>, geometry: Geometry) -> Result<Self> {
        geometry.validate()?;
        let fs = Self {
            block_device,
            geometry,
        };
        fs.read_super_block()?.validate(&geometry)?;
        Ok(fs)
    }

    /// 在设备上建立新的文件系统：
    /// 超级块 | inode 位图 | 数据块位图 | inode 区域 | 数据区域，
    /// 并创建只含 "." 与 ".." 的根目录。
    ///
    /// `total_blocks` 为设备总块数，不足以容纳布局时返回 [`Error::NotEnoughSpace`]。
    pub fn format(
        block_device: Arc<dyn BlockDevice>,
        geometry: Geometry,
        total_blocks: u32,
        num_inodes: u32,
        num_data: u32,
    ) -> Result<Self> {
        let sb = Self::plan(&geometry, num_inodes, num_data)?;
        if sb.data_region.end() > total_blocks {
            return Err(Error::NotEnoughSpace);
        }
        log::info!("formatting {total_blocks} blocks: {sb:?}");

        let fs = Self {
            block_device,
            geometry,
        };

        // 元数据区域清零，数据区保持原样
        let zero = vec![0; geometry.block_size];
        for block_id in 0..sb.data_region.addr {
            fs.write_block(block_id, &zero);
        }

        let mut block = zero.clone();
        sb.encode(&mut block);
        fs.write_block(0, &block);

        let mut inode_bitmap = fs.read_bitmap(sb.inode_bitmap, sb.num_inodes);
        let mut data_bitmap = fs.read_bitmap(sb.data_bitmap, sb.num_data);
        let root = inode_bitmap.alloc().ok_or(Error::NotEnoughSpace)?;
        assert_eq!(root, ROOT_INODE);
        let root_block = sb.data_block(data_bitmap.alloc().ok_or(Error::NotEnoughSpace)?);

        fs.write_block(
            root_block,
            &Directory::init_block(&geometry, ROOT_INODE, ROOT_INODE),
        );
        let mut root_inode = DiskInode::new(InodeKind::Directory, &geometry);
        root_inode.size = 2 * DirEntry::SIZE as u32;
        root_inode.direct[0] = root_block;
        fs.write_inode(&sb, ROOT_INODE, &root_inode)?;
        fs.write_bitmap(sb.inode_bitmap, &inode_bitmap);
        fs.write_bitmap(sb.data_bitmap, &data_bitmap);

        Ok(fs)
    }

    /// 为给定的 inode 数与数据块数计算布局。
    ///
    /// 超级块字段按 i32 存储：计数为 0、超过 `i32::MAX`，
    /// 或布局末端超出 i32 范围时返回 [`Error::InvalidSize`]。
    pub fn plan(geometry: &Geometry, num_inodes: u32, num_data: u32) -> Result<SuperBlock> {
        const LIMIT: u32 = i32::MAX as u32;
        geometry.validate()?;
        if !(1..=LIMIT).contains(&num_inodes) || !(1..=LIMIT).contains(&num_data) {
            return Err(Error::InvalidSize);
        }

        let bits = geometry.bits_per_block();
        let inode_bitmap_len = (num_inodes as usize).div_ceil(bits) as u32;
        let data_bitmap_len = (num_data as usize).div_ceil(bits) as u32;
        let inode_region_len = (num_inodes as usize).div_ceil(geometry.inodes_per_block()) as u32;

        let region = |addr: u32, len: u32| {
            addr.checked_add(len)
                .filter(|&end| end <= LIMIT)
                .map(|_| Region::new(addr, len))
                .ok_or(Error::InvalidSize)
        };
        let inode_bitmap = region(1, inode_bitmap_len)?;
        let data_bitmap = region(inode_bitmap.end(), data_bitmap_len)?;
        let inode_region = region(data_bitmap.end(), inode_region_len)?;
        let data_region = region(inode_region.end(), num_data)?;

        Ok(SuperBlock {
            inode_bitmap,
            data_bitmap,
            inode_region,
            data_region,
            num_inodes,
            num_data,
        })
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn read_super_block(&self) -> Result<SuperBlock> {
        SuperBlock::decode(&self.read_block(0))
    }

    pub fn read_inode_bitmap(&self) -> Result<Bitmap> {
        let sb = self.read_super_block()?;
        Ok(self.read_bitmap(sb.inode_bitmap, sb.num_inodes))
    }

    pub fn read_data_bitmap(&self) -> Result<Bitmap> {
        let sb = self.read_super_block()?;
        Ok(self.read_bitmap(sb.data_bitmap, sb.num_data))
    }

    /// 读取 inode 记录，只检查编号是否越界
    pub fn stat(&self, inode_id: u32) -> Result<DiskInode> {
        let sb = self.read_super_block()?;
        self.read_inode(&sb, inode_id)
    }
}

/* 布局读取 */
impl UnixFileSystem {
    pub(crate) fn read_block(&self, block_id: u32) -> Vec<u8> {
        log::trace!("read block {block_id}");
        let mut buf = vec![0; self.geometry.block_size];
        self.block_device.read_block(block_id as usize, &mut buf);
        buf
    }

    pub(crate) fn write_block(&self, block_id: u32, buf: &[u8]) {
        log::trace!("write block {block_id}");
        debug_assert_eq!(buf.len(), self.geometry.block_size);
        self.block_device.write_block(block_id as usize, buf);
    }

    /// 整个位图区域读入一块连续缓冲区
    pub(crate) fn read_bitmap(&self, region: Region, capacity: u32) -> Bitmap {
        let bytes = (region.addr..region.end())
            .flat_map(|block_id| self.read_block(block_id))
            .collect();
        Bitmap::new(bytes, capacity as usize)
    }

    /// 位图区域的每一块都写回，哪怕只改了一位
    pub(crate) fn write_bitmap(&self, region: Region, bitmap: &Bitmap) {
        for (block_id, chunk) in
            (region.addr..region.end()).zip(bitmap.as_bytes().chunks(self.geometry.block_size))
        {
            self.write_block(block_id, chunk);
        }
    }
}

/* inode 存取 */
impl UnixFileSystem {
    /// 通过编号获取 inode 在磁盘上的位置：**块ID**以及**块内偏移**
    pub(crate) fn inode_pos(&self, sb: &SuperBlock, inode_id: u32) -> (u32, usize) {
        let per_block = self.geometry.inodes_per_block() as u32;
        let block_id = sb.inode_region.addr + inode_id / per_block;
        let block_offset = (inode_id % per_block) as usize * self.geometry.inode_size();

        (block_id, block_offset)
    }

    pub(crate) fn read_inode(&self, sb: &SuperBlock, inode_id: u32) -> Result<DiskInode> {
        if inode_id >= sb.num_inodes {
            return Err(Error::InvalidInode);
        }
        let (block_id, offset) = self.inode_pos(sb, inode_id);
        let block = self.read_block(block_id);
        DiskInode::decode(&block[offset..offset + self.geometry.inode_size()], &self.geometry)
    }

    /// 读-改-写 inode 所在的整块，不影响同块的其它记录
    pub(crate) fn write_inode(
        &self,
        sb: &SuperBlock,
        inode_id: u32,
        inode: &DiskInode,
    ) -> Result<()> {
        if inode_id >= sb.num_inodes {
            return Err(Error::InvalidInode);
        }
        let (block_id, offset) = self.inode_pos(sb, inode_id);
        let mut block = self.read_block(block_id);
        inode.encode(&mut block[offset..offset + self.geometry.inode_size()]);
        self.write_block(block_id, &block);
        Ok(())
    }

    /// 已分配的 inode：编号在范围内、位图中已置位、直接索引都落在数据区
    pub(crate) fn load_inode(
        &self,
        sb: &SuperBlock,
        inode_bitmap: &Bitmap,
        inode_id: u32,
    ) -> Result<DiskInode> {
        if !inode_bitmap.is_allocated(inode_id) {
            return Err(Error::InvalidInode);
        }
        let inode = self.read_inode(sb, inode_id)?;
        inode.check(sb, &self.geometry)?;
        Ok(inode)
    }

    /// 按直接索引顺序读出 inode 的前 `buf.len()` 字节(不超过文件大小)，返回读出的字节数。
    ///
    /// 为 0 的直接索引视作空洞：跳过对应的字节区间，`buf` 中这部分保持原样。
    pub(crate) fn read_data(&self, inode: &DiskInode, buf: &mut [u8]) -> usize {
        let bs = self.geometry.block_size;
        let len = buf.len().min(inode.size as usize);

        for (chunk, &block_id) in buf[..len].chunks_mut(bs).zip(&inode.direct) {
            if block_id == 0 {
                continue;
            }
            let block = self.read_block(block_id);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }

        len
    }
}
