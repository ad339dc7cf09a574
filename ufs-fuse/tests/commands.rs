use std::io::Write;

use tempfile::{NamedTempFile, TempDir};
use ufs::{Geometry, InodeKind, UnixFileSystem, ROOT_INODE};
use ufs_fuse::commands::{self, ToolError};

const GEOMETRY: Geometry = Geometry::new(1024, 4);

fn image() -> (TempDir, UnixFileSystem) {
    let dir = TempDir::new().unwrap();
    let fs = commands::create_image(&dir.path().join("fs.img"), GEOMETRY, 32, 32).unwrap();
    (dir, fs)
}

fn output(run: impl FnOnce(&mut Vec<u8>) -> ufs_fuse::Result<()>) -> String {
    let mut out = Vec::<u8>::new();
    run(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn message(err: ToolError) -> &'static str {
    match err {
        ToolError::Fs { message, .. } => message,
        ToolError::Io(err) => panic!("unexpected io error: {err}"),
    }
}

#[test]
fn image_is_sized_to_its_layout() {
    let (dir, _) = image();
    let len = std::fs::metadata(dir.path().join("fs.img")).unwrap().len();
    // 超级块、两张位图、一块 inode 区域，再加 32 个数据块
    assert_eq!(len, 36 * 1024);

    let fs = commands::open_image(&dir.path().join("fs.img"), GEOMETRY).unwrap();
    assert_eq!(fs.resolve("/"), Ok(ROOT_INODE));
}

#[test]
fn open_rejects_blank_file() {
    let blank = NamedTempFile::new().unwrap();
    blank.as_file().set_len(8 * 1024).unwrap();
    let err = commands::open_image(blank.path(), GEOMETRY);
    assert!(matches!(
        err,
        Err(ToolError::Fs {
            source: ufs::Error::Corrupted,
            ..
        })
    ));
}

#[test]
fn bits_of_fresh_image() {
    let (_dir, fs) = image();
    let text = output(|out| commands::bits(&fs, out));
    assert_eq!(
        text,
        "Super\n\
         inode_region_addr 3\n\
         inode_region_len 1\n\
         num_inodes 32\n\
         data_region_addr 4\n\
         data_region_len 32\n\
         num_data 32\n\
         \n\
         Inode bitmap\n\
         1 0 0 0 \n\
         \n\
         Data bitmap\n\
         1 0 0 0 \n"
    );
}

#[test]
fn cat_prints_blocks_then_data() {
    let (_dir, fs) = image();
    let file = fs.create(ROOT_INODE, InodeKind::File, "note").unwrap();
    fs.write(file, b"hello").unwrap();

    let text = output(|out| commands::cat(&fs, file, out));
    assert_eq!(text, "File blocks\n5\n\nFile data\nhello");

    let mut out = Vec::<u8>::new();
    let err = commands::cat(&fs, ROOT_INODE, &mut out).unwrap_err();
    assert_eq!(message(err), "Error reading file");
    assert!(out.is_empty());
}

#[test]
fn cat_of_unlinked_file_prints_nothing() {
    let (_dir, fs) = image();
    let file = fs.create(ROOT_INODE, InodeKind::File, "gone").unwrap();
    fs.write(file, b"stale").unwrap();
    fs.unlink(ROOT_INODE, "gone").unwrap();

    let mut out = Vec::<u8>::new();
    let err = commands::cat(&fs, file, &mut out).unwrap_err();
    assert!(matches!(
        err,
        ToolError::Fs {
            message: "Error reading file",
            source: ufs::Error::InvalidInode,
        }
    ));
    assert!(out.is_empty());
}

#[test]
fn mkfs_rejects_oversized_counts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fs.img");
    let result = commands::create_image(&path, GEOMETRY, 32, u32::MAX);
    assert!(matches!(
        result,
        Err(ToolError::Fs {
            source: ufs::Error::InvalidSize,
            ..
        })
    ));
    // 布局检查先于创建镜像文件
    assert!(!path.exists());
}

#[test]
fn ls_sorts_by_name() {
    let (_dir, fs) = image();
    let docs = fs.create(ROOT_INODE, InodeKind::Directory, "docs").unwrap();
    let zeta = fs.create(docs, InodeKind::File, "zeta").unwrap();
    let alpha = fs.create(docs, InodeKind::File, "alpha").unwrap();

    let text = output(|out| commands::ls(&fs, "/docs", out));
    assert_eq!(
        text,
        format!("{docs}\t.\n0\t..\n{alpha}\talpha\n{zeta}\tzeta\n")
    );

    let text = output(|out| commands::ls(&fs, "/docs/zeta", out));
    assert_eq!(text, format!("{zeta}\tzeta\n"));

    let err = commands::ls(&fs, "/docs/missing", &mut Vec::<u8>::new()).unwrap_err();
    assert_eq!(message(err), "Directory not found");
}

#[test]
fn cp_overwrites_file() {
    let (_dir, fs) = image();
    let file = fs.create(ROOT_INODE, InodeKind::File, "copy").unwrap();
    let dir = fs.create(ROOT_INODE, InodeKind::Directory, "dir").unwrap();

    let mut src = NamedTempFile::new().unwrap();
    src.write_all(&[0xab; 1500]).unwrap();
    src.flush().unwrap();

    assert_eq!(commands::cp(&fs, src.path(), file).unwrap(), 1500);
    let mut buf = vec![0; 1500];
    assert_eq!(fs.read(file, &mut buf), Ok(1500));
    assert!(buf.iter().all(|&byte| byte == 0xab));

    let err = commands::cp(&fs, src.path(), dir).unwrap_err();
    assert_eq!(message(err), "Could not write to dst_file");
}

#[test]
fn changes_survive_reopening() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fs.img");
    {
        let fs = commands::create_image(&path, GEOMETRY, 16, 16).unwrap();
        let file = fs.create(ROOT_INODE, InodeKind::File, "kept").unwrap();
        fs.write(file, b"on disk").unwrap();
    }

    let fs = commands::open_image(&path, GEOMETRY).unwrap();
    let file = fs.resolve("/kept").unwrap();
    let text = output(|out| commands::cat(&fs, file, out));
    assert!(text.ends_with("File data\non disk"));
}
