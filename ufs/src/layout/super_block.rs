use super::{get_i32, put_i32};
use crate::{Error, Geometry, Result};

/// 一段连续的块：起始块号与块数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub addr: u32,
    pub len: u32,
}

impl Region {
    #[inline]
    pub const fn new(addr: u32, len: u32) -> Self {
        Self { addr, len }
    }

    #[inline]
    pub const fn end(&self) -> u32 {
        self.addr + self.len
    }

    #[inline]
    fn overlaps(&self, other: &Region) -> bool {
        self.addr < other.end() && other.addr < self.end()
    }
}

/// 超级块：位于 0 号块，定位其它连续区域。
/// 格式化后不再改写。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub inode_bitmap: Region,
    pub data_bitmap: Region,
    pub inode_region: Region,
    pub data_region: Region,
    pub num_inodes: u32,
    /// 数据块总数，不超过数据区的长度
    pub num_data: u32,
}

impl SuperBlock {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut fields = [0u32; 10];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = u32::try_from(get_i32(buf, i * 4)).map_err(|_| {
                log::warn!("super block field #{i} is negative");
                Error::Corrupted
            })?;
        }
        let [ib_addr, ib_len, db_addr, db_len, ir_addr, ir_len, dr_addr, dr_len, num_inodes, num_data] =
            fields;

        Ok(Self {
            inode_bitmap: Region::new(ib_addr, ib_len),
            data_bitmap: Region::new(db_addr, db_len),
            inode_region: Region::new(ir_addr, ir_len),
            data_region: Region::new(dr_addr, dr_len),
            num_inodes,
            num_data,
        })
    }

    pub fn encode(&self, buf: &mut [u8]) {
        let fields = [
            self.inode_bitmap.addr,
            self.inode_bitmap.len,
            self.data_bitmap.addr,
            self.data_bitmap.len,
            self.inode_region.addr,
            self.inode_region.len,
            self.data_region.addr,
            self.data_region.len,
            self.num_inodes,
            self.num_data,
        ];
        for (i, field) in fields.into_iter().enumerate() {
            put_i32(buf, i * 4, field as i32);
        }
    }

    /// 检查各区域能否容纳超级块声明的 inode 数与数据块数，且互不重叠
    pub fn validate(&self, geometry: &Geometry) -> Result<()> {
        let bits = geometry.bits_per_block();
        let regions = [
            self.inode_bitmap,
            self.data_bitmap,
            self.inode_region,
            self.data_region,
        ];

        let fits = self.num_inodes > 0
            && self.num_data > 0
            && regions.iter().all(|r| r.addr > 0 && r.len > 0)
            && self.inode_bitmap.len as usize * bits >= self.num_inodes as usize
            && self.data_bitmap.len as usize * bits >= self.num_data as usize
            && self.inode_region.len as usize * geometry.inodes_per_block()
                >= self.num_inodes as usize
            && self.data_region.len >= self.num_data;
        let disjoint = regions
            .iter()
            .enumerate()
            .all(|(i, a)| regions[i + 1..].iter().all(|b| !a.overlaps(b)));

        if fits && disjoint {
            Ok(())
        } else {
            log::warn!("super block doesn't describe a usable layout: {self:?}");
            Err(Error::Corrupted)
        }
    }

    /// 数据块在位图中的编号 -> 绝对块号
    #[inline]
    pub fn data_block(&self, index: u32) -> u32 {
        self.data_region.addr + index
    }

    /// 绝对块号 -> 数据块在位图中的编号；不属于数据区则为空
    #[inline]
    pub fn data_index(&self, block_id: u32) -> Option<u32> {
        block_id
            .checked_sub(self.data_region.addr)
            .filter(|&index| index < self.num_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SuperBlock {
        SuperBlock {
            inode_bitmap: Region::new(1, 1),
            data_bitmap: Region::new(2, 1),
            inode_region: Region::new(3, 4),
            data_region: Region::new(7, 100),
            num_inodes: 128,
            num_data: 100,
        }
    }

    #[test]
    fn field_order_and_endianness() {
        let mut buf = [0u8; 64];
        sample().encode(&mut buf);
        assert_eq!(&buf[..8], &[1, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(&buf[28..32], &[100, 0, 0, 0]);
        assert_eq!(&buf[32..36], &[128, 0, 0, 0]);
        assert_eq!(SuperBlock::decode(&buf), Ok(sample()));
    }

    #[test]
    fn negative_field_is_corrupted() {
        let mut buf = [0u8; 64];
        sample().encode(&mut buf);
        put_i32(&mut buf, 32, -5);
        assert_eq!(SuperBlock::decode(&buf), Err(Error::Corrupted));
    }

    #[test]
    fn validate_layout() {
        let geometry = Geometry::default();
        assert!(sample().validate(&geometry).is_ok());

        let mut overlapping = sample();
        overlapping.data_bitmap = Region::new(3, 1);
        assert_eq!(overlapping.validate(&geometry), Err(Error::Corrupted));

        let mut too_many = sample();
        too_many.num_data = 101;
        assert_eq!(too_many.validate(&geometry), Err(Error::Corrupted));
    }

    #[test]
    fn data_block_mapping() {
        let sb = sample();
        assert_eq!(sb.data_block(0), 7);
        assert_eq!(sb.data_index(7), Some(0));
        assert_eq!(sb.data_index(106), Some(99));
        assert_eq!(sb.data_index(107), None);
        assert_eq!(sb.data_index(6), None);
    }
}
