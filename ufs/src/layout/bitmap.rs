use alloc::vec::Vec;

/// 位图区域在内存中的完整拷贝，记录其指示区域的分配情况。
///
/// 每字节 8 位，字节内低位在前：第 `i` 位位于 `bytes[i / 8]` 的第 `i % 8` 位。
/// 1 表示已分配，0 表示空闲。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// 整块读出的位图字节，长度恒为块大小的整数倍
    bytes: Vec<u8>,
    /// 位图所指示区域的单元总数，只有前 `capacity` 位参与分配
    capacity: usize,
}

impl Bitmap {
    #[inline]
    pub fn new(bytes: Vec<u8>, capacity: usize) -> Self {
        debug_assert!(capacity <= bytes.len() * 8);
        Self { bytes, capacity }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn is_allocated(&self, index: u32) -> bool {
        let index = index as usize;
        index < self.capacity && self.bytes[index / 8] & (1 << (index % 8)) != 0
    }

    /// 在指示区域内分配编号最小的空闲单元，返回其编号。
    /// 若位图的空间用尽，则返回空。
    pub fn alloc(&mut self) -> Option<u32> {
        // 寻找还有剩余空间的字节(即还有0)，低位优先
        let (byte_index, bit) = self
            .bytes
            .iter()
            .enumerate()
            .find_map(|(i, &bits)| (bits != u8::MAX).then_some((i, bits.trailing_ones())))?;

        let index = byte_index * 8 + bit as usize;
        // 最低的空闲位已超出容量，说明容量内全部占用
        if index >= self.capacity {
            return None;
        }

        self.bytes[byte_index] |= 1 << bit;
        Some(index as u32)
    }

    /// 清除对应位；重复释放不报错
    #[inline]
    pub fn dealloc(&mut self, index: u32) {
        let index = index as usize;
        if index < self.capacity {
            self.bytes[index / 8] &= !(1 << (index % 8));
        }
    }

    /// 已分配单元的个数
    pub fn count_allocated(&self) -> usize {
        (0..self.capacity as u32)
            .filter(|&i| self.is_allocated(i))
            .count()
    }
}
