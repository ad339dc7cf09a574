//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、U盘、磁盘镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 块的大小由使用者约定，驱动只保证整块读写：
//! 传入的缓冲区长度即为块大小。

#![no_std]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;

use spin::Mutex;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 读出第 `block_id` 块，填满 `buf`
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    /// 以 `buf` 覆盖第 `block_id` 块
    fn write_block(&self, block_id: usize, buf: &[u8]);
}

/// 内存盘：块连续存放在一段堆内存里
#[derive(Debug)]
pub struct RamDisk {
    block_size: usize,
    blocks: usize,
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new(block_size: usize, blocks: usize) -> Self {
        Self {
            block_size,
            blocks,
            data: Mutex::new(vec![0; block_size * blocks]),
        }
    }

    /// 整个设备内容的拷贝，便于比对前后状态
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn range(&self, block_id: usize, len: usize) -> core::ops::Range<usize> {
        assert!(block_id < self.blocks, "block {block_id} out of device");
        assert_eq!(len, self.block_size, "not a complete block!");
        let start = block_id * self.block_size;
        start..start + self.block_size
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let range = self.range(block_id, buf.len());
        buf.copy_from_slice(&self.data.lock()[range]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let range = self.range(block_id, buf.len());
        self.data.lock()[range].copy_from_slice(buf);
    }
}
