pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// inode 编号越界或未分配
    #[error("invalid inode")]
    InvalidInode,
    /// inode 类型不符合操作要求
    #[error("invalid inode type")]
    InvalidType,
    #[error("invalid name")]
    InvalidName,
    /// 读写长度超出单个文件的容量
    #[error("invalid size")]
    InvalidSize,
    /// inode 或数据块耗尽
    #[error("not enough space")]
    NotEnoughSpace,
    #[error("entry not found")]
    NotFound,
    /// 目录内还有 "." 与 ".." 以外的项
    #[error("directory not empty")]
    NotEmpty,
    /// 磁盘上的数据无法解码
    #[error("corrupted filesystem image")]
    Corrupted,
}

impl Error {
    /// 负整数形式的错误码，供只认数字的调用者使用
    pub const fn code(self) -> i32 {
        match self {
            Error::InvalidInode => -1,
            Error::InvalidType => -2,
            Error::InvalidName => -3,
            Error::InvalidSize => -4,
            Error::NotEnoughSpace => -5,
            Error::NotFound => -6,
            Error::NotEmpty => -7,
            Error::Corrupted => -8,
        }
    }
}
