use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use block_dev::BlockDevice;

/// 以宿主机上的普通文件作为块设备，块大小由镜像的几何参数决定
#[derive(Debug)]
pub struct BlockFile {
    inner: Mutex<File>,
    block_size: usize,
}

impl BlockFile {
    pub fn new(fd: File, block_size: usize) -> Self {
        Self {
            inner: Mutex::new(fd),
            block_size,
        }
    }

    fn seek(&self, file: &mut File, block_id: usize) {
        file.seek(SeekFrom::Start((block_id * self.block_size) as u64))
            .expect("seeking error");
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), self.block_size, "not a complete block!");
        let mut file = self.inner.lock().unwrap();
        self.seek(&mut file, block_id);
        file.read_exact(buf).expect("not a complete block!");
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), self.block_size, "not a complete block!");
        let mut file = self.inner.lock().unwrap();
        self.seek(&mut file, block_id);
        file.write_all(buf).expect("not a complete block!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_land_at_their_offsets() {
        let fd = tempfile::tempfile().unwrap();
        fd.set_len(4 * 64).unwrap();
        let file = BlockFile::new(fd, 64);

        file.write_block(2, &[7; 64]);
        let mut buf = [0; 64];
        file.read_block(2, &mut buf);
        assert_eq!(buf, [7; 64]);
        file.read_block(1, &mut buf);
        assert_eq!(buf, [0; 64]);
    }

    #[test]
    #[should_panic(expected = "not a complete block!")]
    fn reading_past_the_end() {
        let fd = tempfile::tempfile().unwrap();
        fd.set_len(64).unwrap();
        let file = BlockFile::new(fd, 64);
        file.read_block(1, &mut [0; 64]);
    }
}
