//! 镜像工具的各个子命令，输出写入调用者给出的 `out`

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use ufs::{Geometry, UnixFileSystem};

use crate::BlockFile;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// 文件系统拒绝了操作，`message` 是给用户看的提示
    #[error("{message}")]
    Fs {
        message: &'static str,
        #[source]
        source: ufs::Error,
    },
}

impl ToolError {
    fn fs(message: &'static str) -> impl FnOnce(ufs::Error) -> Self {
        move |source| Self::Fs { message, source }
    }
}

/// 新建(或截断)镜像文件，大小恰好容纳布局，并在其上格式化
pub fn create_image(
    path: &Path,
    geometry: Geometry,
    num_inodes: u32,
    num_data: u32,
) -> Result<UnixFileSystem> {
    geometry
        .validate()
        .map_err(ToolError::fs("Invalid geometry"))?;
    let total_blocks = UnixFileSystem::plan(&geometry, num_inodes, num_data)
        .map_err(ToolError::fs("Invalid inode or data block count"))?
        .data_region
        .end();

    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    fd.set_len(total_blocks as u64 * geometry.block_size as u64)?;
    log::info!("image {path:?}: {total_blocks} blocks of {} bytes", geometry.block_size);

    let block_file = Arc::new(BlockFile::new(fd, geometry.block_size));
    UnixFileSystem::format(block_file, geometry, total_blocks, num_inodes, num_data)
        .map_err(ToolError::fs("Could not format image"))
}

pub fn open_image(path: &Path, geometry: Geometry) -> Result<UnixFileSystem> {
    let fd = OpenOptions::new().read(true).write(true).open(path)?;
    let block_file = Arc::new(BlockFile::new(fd, geometry.block_size));
    UnixFileSystem::open(block_file, geometry).map_err(ToolError::fs("Could not open image"))
}

/// 超级块的区域信息，以及两张位图中覆盖有效单元的字节
pub fn bits(fs: &UnixFileSystem, out: &mut impl Write) -> Result<()> {
    let sb = fs
        .read_super_block()
        .map_err(ToolError::fs("Could not read super block"))?;
    let inode_bitmap = fs
        .read_inode_bitmap()
        .map_err(ToolError::fs("Could not read super block"))?;
    let data_bitmap = fs
        .read_data_bitmap()
        .map_err(ToolError::fs("Could not read super block"))?;

    writeln!(out, "Super")?;
    writeln!(out, "inode_region_addr {}", sb.inode_region.addr)?;
    writeln!(out, "inode_region_len {}", sb.inode_region.len)?;
    writeln!(out, "num_inodes {}", sb.num_inodes)?;
    writeln!(out, "data_region_addr {}", sb.data_region.addr)?;
    writeln!(out, "data_region_len {}", sb.data_region.len)?;
    writeln!(out, "num_data {}", sb.num_data)?;
    writeln!(out)?;

    writeln!(out, "Inode bitmap")?;
    write_bitmap_bytes(out, inode_bitmap.as_bytes(), sb.num_inodes)?;
    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "Data bitmap")?;
    write_bitmap_bytes(out, data_bitmap.as_bytes(), sb.num_data)?;
    writeln!(out)?;

    Ok(())
}

fn write_bitmap_bytes(out: &mut impl Write, bytes: &[u8], capacity: u32) -> io::Result<()> {
    for byte in &bytes[..(capacity as usize).div_ceil(8)] {
        write!(out, "{byte} ")?;
    }
    Ok(())
}

/// 普通文件所用的数据块与文件内容；出错时不输出任何内容
pub fn cat(fs: &UnixFileSystem, inode_id: u32, out: &mut impl Write) -> Result<()> {
    let fail = ToolError::fs("Error reading file");
    let inode = match fs.stat(inode_id) {
        Ok(inode) if inode.is_file() => inode,
        Ok(_) => return Err(fail(ufs::Error::InvalidType)),
        Err(err) => return Err(fail(err)),
    };

    // stat 不检查分配情况，先读出内容以确认 inode 仍然存在
    let mut data = vec![0; inode.size as usize];
    let len = fs
        .read(inode_id, &mut data)
        .map_err(ToolError::fs("Error reading file"))?;

    writeln!(out, "File blocks")?;
    for block_id in inode.data_blocks(fs.geometry()) {
        writeln!(out, "{block_id}")?;
    }
    writeln!(out)?;
    writeln!(out, "File data")?;
    out.write_all(&data[..len])?;

    Ok(())
}

/// 目录按名字排序列出 `inum\tname`；普通文件只列出自身
pub fn ls(fs: &UnixFileSystem, path: &str, out: &mut impl Write) -> Result<()> {
    let inode_id = fs
        .resolve(path)
        .map_err(ToolError::fs("Directory not found"))?;
    let inode = fs
        .stat(inode_id)
        .map_err(ToolError::fs("Directory not found"))?;

    if inode.is_file() {
        let name = path.rsplit('/').find(|cmp| !cmp.is_empty()).unwrap_or(path);
        writeln!(out, "{inode_id}\t{name}")?;
        return Ok(());
    }

    let mut entries = fs
        .read_dir(inode_id)
        .map_err(ToolError::fs("Directory not found"))?;
    entries.sort_by(|a, b| a.name_bytes().cmp(b.name_bytes()));
    for entry in &entries {
        if let Some(inum) = entry.inode() {
            writeln!(out, "{inum}\t{}", entry.name())?;
        }
    }

    Ok(())
}

/// 以宿主机文件的内容覆盖 `inode_id`
pub fn cp(fs: &UnixFileSystem, src: &Path, inode_id: u32) -> Result<usize> {
    let data = std::fs::read(src)?;
    let written = fs
        .write(inode_id, &data)
        .map_err(ToolError::fs("Could not write to dst_file"))?;
    log::info!("copied {src:?} into inode {inode_id}: {written} bytes");
    Ok(written)
}
