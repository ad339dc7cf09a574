//! # 磁盘数据结构层
//!
//! ufs 的磁盘布局：
//! 超级块 | 索引节点位图 | 数据块位图 | 索引节点区域 | 数据块区域
//!
//! 各区域的位置与长度都记录在超级块里。
//! 所有整数一律按小端序逐字段编解码，不依赖结构体的内存布局。

mod super_block;
pub use super_block::{Region, SuperBlock};

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{DiskInode, InodeKind};

/// 目录项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::DirEntry;

#[inline]
fn get_i32(buf: &[u8], offset: usize) -> i32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_le_bytes(bytes)
}

#[inline]
fn get_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
