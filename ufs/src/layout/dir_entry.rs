use super::{get_i32, put_i32};
use crate::{Error, Result};

const NAME_CAP: usize = 28;

/// 文件系统项的元信息：| name: [u8; 28] | inum: i32 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    // 最后一字节留给 \0
    name: [u8; NAME_CAP],
    inum: i32,
}

impl DirEntry {
    /// 元信息大小恒为32字节
    pub const SIZE: usize = 32;
    pub const NAME_MAX_LEN: usize = NAME_CAP - 1;
    /// 空闲槽位的 inode 编号
    const FREE: i32 = -1;

    /// 名字须先经 [`DirEntry::validate_name`] 检查
    #[inline]
    pub fn new(name: &str, inum: u32) -> Self {
        let bytes = name.as_bytes();
        let mut raw = [0; NAME_CAP];
        raw[..bytes.len()].copy_from_slice(bytes);

        Self {
            name: raw,
            inum: inum as i32,
        }
    }

    /// 空闲(已删除)槽位
    #[inline]
    pub const fn free() -> Self {
        Self {
            name: [0; NAME_CAP],
            inum: Self::FREE,
        }
    }

    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty()
            || name.len() > Self::NAME_MAX_LEN
            || name.contains(|c: char| c == '/' || c == '\0')
        {
            return Err(Error::InvalidName);
        }
        Ok(())
    }

    #[inline]
    pub fn name_bytes(&self) -> &[u8] {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(NAME_CAP);
        &self.name[..len]
    }

    pub fn name(&self) -> &str {
        core::str::from_utf8(self.name_bytes()).unwrap_or_default()
    }

    /// 空闲槽位没有 inode
    #[inline]
    pub fn inode(&self) -> Option<u32> {
        u32::try_from(self.inum).ok()
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.inode().is_none()
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        matches!(self.name_bytes(), b"." | b"..")
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut name = [0; NAME_CAP];
        name.copy_from_slice(&buf[..NAME_CAP]);

        Self {
            name,
            inum: get_i32(buf, NAME_CAP),
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[..NAME_CAP].copy_from_slice(&self.name);
        put_i32(buf, NAME_CAP, self.inum);
    }
}
