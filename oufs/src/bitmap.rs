// Bitmap 管理一组资源（inode 或者磁盘块）的分配状态，每个二进制位对应一个资源
// 字节优先、字节内从低位到高位扫描，总是分配序号最小的空闲资源
pub struct Bitmap<'a> {
    bits: &'a mut [u8], // 位图所在的字节
    capacity: usize,    // 位图管理的资源总数
}

impl<'a> Bitmap<'a> {
    pub fn new(bits: &'a mut [u8], capacity: usize) -> Self {
        assert!(capacity <= bits.len() * 8, "bitmap capacity overflow");
        Self { bits, capacity }
    }

    // 分配一个资源，找到第一个0并置1，全部被占用时返回None且不修改位图
    pub fn alloc(&mut self) -> Option<usize> {
        let capacity = self.capacity;
        let (idx, offset) = self
            .bits
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte != u8::MAX)
            .map(|(idx, byte)| (idx, byte.trailing_ones() as usize))
            .find(|(idx, offset)| compose(*idx, *offset) < capacity)?;
        self.bits[idx] |= 1u8 << offset;
        Some(compose(idx, offset))
    }

    // 回收资源，调用者保证该位已经被分配
    pub fn dealloc(&mut self, id: usize) {
        let (idx, offset) = decompose(id);
        debug_assert!(self.bits[idx] & (1u8 << offset) != 0, "double free of {}", id);
        self.bits[idx] &= !(1u8 << offset);
    }

    pub fn is_allocated(&self, id: usize) -> bool {
        test_bit(self.bits, id)
    }
}

pub fn test_bit(bits: &[u8], id: usize) -> bool {
    let (idx, offset) = decompose(id);
    bits[idx] & (1u8 << offset) != 0
}

pub fn count_allocated(bits: &[u8], capacity: usize) -> usize {
    (0..capacity).filter(|id| test_bit(bits, *id)).count()
}

// 从字节序号和字节内的offset获得资源序号
fn compose(idx: usize, offset: usize) -> usize {
    idx * 8 + offset
}

fn decompose(id: usize) -> (usize, usize) {
    (id / 8, id % 8)
}
