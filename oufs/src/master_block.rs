use crate::bitmap::{count_allocated, test_bit, Bitmap};
use crate::error::{FsError, Result};
use crate::layout::{BlockRef, InodeRef, N_BLOCKS, N_INODES, ROOT_DIRECTORY_BLOCK, ROOT_INODE};

pub const INODE_BITMAP_BYTES: usize = (N_INODES + 7) / 8;
pub const BLOCK_BITMAP_BYTES: usize = (N_BLOCKS + 7) / 8;

// 0号块，记录 inode 和磁盘块的分配情况
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MasterBlock {
    pub inode_allocated: [u8; INODE_BITMAP_BYTES], // inode bitmap
    pub block_allocated: [u8; BLOCK_BITMAP_BYTES], // 磁盘块 bitmap
}

impl MasterBlock {
    // 格式化后的状态：根目录 inode，以及 master 块、inode 表、根目录块已分配
    pub fn formatted() -> Self {
        let mut master = Self {
            inode_allocated: [0; INODE_BITMAP_BYTES],
            block_allocated: [0; BLOCK_BITMAP_BYTES],
        };
        let mut inodes = master.inode_bitmap();
        assert_eq!(inodes.alloc(), Some(ROOT_INODE as usize));
        let mut blocks = master.block_bitmap();
        for _ in 0..=ROOT_DIRECTORY_BLOCK {
            blocks.alloc();
        }
        master
    }

    pub fn inode_bitmap(&mut self) -> Bitmap<'_> {
        Bitmap::new(&mut self.inode_allocated, N_INODES)
    }

    pub fn block_bitmap(&mut self) -> Bitmap<'_> {
        Bitmap::new(&mut self.block_allocated, N_BLOCKS)
    }

    pub fn alloc_inode(&mut self) -> Result<InodeRef> {
        self.inode_bitmap()
            .alloc()
            .map(|id| id as InodeRef)
            .ok_or(FsError::NoFreeInodes)
    }

    pub fn alloc_block(&mut self) -> Result<BlockRef> {
        self.block_bitmap()
            .alloc()
            .map(|id| id as BlockRef)
            .ok_or(FsError::NoFreeBlocks)
    }

    pub fn dealloc_inode(&mut self, inode: InodeRef) {
        self.inode_bitmap().dealloc(inode as usize);
    }

    pub fn dealloc_block(&mut self, block: BlockRef) {
        self.block_bitmap().dealloc(block as usize);
    }

    pub fn inode_allocated(&self, inode: InodeRef) -> bool {
        (inode as usize) < N_INODES && test_bit(&self.inode_allocated, inode as usize)
    }

    pub fn block_allocated(&self, block: BlockRef) -> bool {
        (block as usize) < N_BLOCKS && test_bit(&self.block_allocated, block as usize)
    }

    pub fn allocated_inodes(&self) -> usize {
        count_allocated(&self.inode_allocated, N_INODES)
    }

    pub fn allocated_blocks(&self) -> usize {
        count_allocated(&self.block_allocated, N_BLOCKS)
    }
}
