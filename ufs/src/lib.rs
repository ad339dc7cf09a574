#![no_std]

extern crate alloc;

/* ufs 的整体架构，自上而下 */

// 对外操作层：lookup / stat / read / write / create / unlink
mod vfs;

// 目录项数组的编解码与维护
mod dir;

// 文件系统层：布局读取、inode 存取、位图持久化、格式化
mod fs;

// 磁盘数据结构层：超级块、位图、inode、目录项的定长编码
mod layout;

mod config;
mod error;

pub use block_dev::BlockDevice;

pub use self::{
    config::Geometry,
    error::{Error, Result},
    fs::UnixFileSystem,
    layout::{Bitmap, DirEntry, DiskInode, InodeKind, Region, SuperBlock},
};

/// 根目录固定占用 0 号 inode
pub const ROOT_INODE: u32 = 0;
