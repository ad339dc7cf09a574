use std::sync::Arc;

use block_dev::RamDisk;
use ufs::{Error, Geometry, InodeKind, UnixFileSystem, ROOT_INODE};

const GEOMETRY: Geometry = Geometry::new(1024, 4);

fn mkfs() -> UnixFileSystem {
    let disk = Arc::new(RamDisk::new(1024, 64));
    UnixFileSystem::format(disk, GEOMETRY, 64, 32, 32).unwrap()
}

#[test]
fn end_to_end() {
    let fs = mkfs();

    assert_eq!(fs.create(ROOT_INODE, InodeKind::Directory, "a"), Ok(1));
    assert_eq!(fs.create(1, InodeKind::File, "f.txt"), Ok(2));
    assert_eq!(fs.write(2, b"hello"), Ok(5));

    let mut buf = [0u8; 100];
    assert_eq!(fs.read(2, &mut buf), Ok(5));
    assert_eq!(&buf[..5], b"hello");

    assert_eq!(fs.unlink(1, "f.txt"), Ok(()));
    assert_eq!(fs.lookup(1, "f.txt"), Err(Error::NotFound));
    assert_eq!(fs.unlink(ROOT_INODE, "a"), Ok(()));
    assert_eq!(fs.lookup(ROOT_INODE, "a"), Err(Error::NotFound));

    // 只剩根目录
    assert_eq!(fs.read_inode_bitmap().unwrap().count_allocated(), 1);
    assert_eq!(fs.read_data_bitmap().unwrap().count_allocated(), 1);
}

#[test]
fn fresh_image_layout() {
    let fs = mkfs();
    let sb = fs.read_super_block().unwrap();
    assert_eq!(sb.inode_bitmap.addr, 1);
    assert_eq!(sb.data_bitmap.addr, 2);
    assert_eq!(sb.inode_region.addr, 3);
    assert_eq!(sb.data_region.addr, 4);
    assert_eq!(sb.num_inodes, 32);
    assert_eq!(sb.num_data, 32);

    let root = fs.stat(ROOT_INODE).unwrap();
    assert!(root.is_dir());
    assert_eq!(root.size, 64);
    assert_eq!(root.direct[0], sb.data_region.addr);

    let entries = fs.read_dir(ROOT_INODE).unwrap();
    let names: Vec<_> = entries.iter().map(|e| (e.name(), e.inode())).collect();
    assert_eq!(names, [(".", Some(0)), ("..", Some(0))]);
}

#[test]
fn reopen_sees_same_tree() {
    let disk = Arc::new(RamDisk::new(1024, 64));
    {
        let fs = UnixFileSystem::format(disk.clone(), GEOMETRY, 64, 32, 32).unwrap();
        let dir = fs.create(ROOT_INODE, InodeKind::Directory, "docs").unwrap();
        let file = fs.create(dir, InodeKind::File, "readme").unwrap();
        fs.write(file, b"persisted").unwrap();
    }

    let fs = UnixFileSystem::open(disk, GEOMETRY).unwrap();
    let file = fs.resolve("/docs/readme").unwrap();
    let mut buf = [0u8; 9];
    assert_eq!(fs.read(file, &mut buf), Ok(9));
    assert_eq!(&buf, b"persisted");
}

#[test]
fn open_rejects_unformatted_device() {
    let disk = Arc::new(RamDisk::new(1024, 16));
    assert!(matches!(
        UnixFileSystem::open(disk, GEOMETRY),
        Err(Error::Corrupted)
    ));
}

#[test]
fn format_needs_room() {
    let disk = Arc::new(RamDisk::new(1024, 8));
    assert!(matches!(
        UnixFileSystem::format(disk.clone(), GEOMETRY, 8, 32, 32),
        Err(Error::NotEnoughSpace)
    ));
    assert!(matches!(
        UnixFileSystem::format(disk, GEOMETRY, 8, 0, 1),
        Err(Error::InvalidSize)
    ));
}

#[test]
fn format_rejects_counts_beyond_i32() {
    let disk = Arc::new(RamDisk::new(1024, 64));
    assert!(matches!(
        UnixFileSystem::format(disk.clone(), GEOMETRY, 64, 32, u32::MAX),
        Err(Error::InvalidSize)
    ));
    assert!(matches!(
        UnixFileSystem::format(disk.clone(), GEOMETRY, u32::MAX, i32::MAX as u32 + 1, 32),
        Err(Error::InvalidSize)
    ));
    // 失败的格式化不写盘
    assert!(disk.snapshot().iter().all(|&byte| byte == 0));
}

#[test]
fn resolve_paths() {
    let fs = mkfs();
    let a = fs.create(ROOT_INODE, InodeKind::Directory, "a").unwrap();
    let b = fs.create(a, InodeKind::Directory, "b").unwrap();
    let f = fs.create(b, InodeKind::File, "f").unwrap();

    assert_eq!(fs.resolve("/"), Ok(ROOT_INODE));
    assert_eq!(fs.resolve(""), Ok(ROOT_INODE));
    assert_eq!(fs.resolve("/a/b"), Ok(b));
    assert_eq!(fs.resolve("//a///b/f"), Ok(f));
    assert_eq!(fs.resolve("/a/b/.."), Ok(a));
    assert_eq!(fs.resolve("/a/missing"), Err(Error::NotFound));
    assert_eq!(fs.resolve("/a/b/f/x"), Err(Error::InvalidType));
}
