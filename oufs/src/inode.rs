use crate::error::{FsError, Result};
use crate::layout::{
    BlockRef, InodeRef, BLOCKS_PER_INODE, FIRST_INODE_BLOCK, INODES_PER_BLOCK, INODE_SIZE,
    N_INODES, UNALLOCATED_BLOCK,
};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum InodeType {
    None,
    Directory,
    File,
}

impl InodeType {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(InodeType::None),
            1 => Some(InodeType::Directory),
            2 => Some(InodeType::File),
            _ => None,
        }
    }

    fn raw(self) -> u8 {
        match self {
            InodeType::None => 0,
            InodeType::Directory => 1,
            InodeType::File => 2,
        }
    }
}

// 一个inode，大小32字节，类型按原始字节保存，读取时再解析
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DiskInode {
    inode_type: u8,
    n_references: u8,
    data: [BlockRef; BLOCKS_PER_INODE], // 数据块，目录只使用第一个
    size: u32,                           // 目录：包括 . 和 .. 在内的条目数
}

const _: () = assert!(core::mem::size_of::<DiskInode>() == INODE_SIZE);

impl DiskInode {
    // 全零的 inode，格式化后未使用的 inode 都是这个状态
    pub fn empty() -> Self {
        Self {
            inode_type: 0,
            n_references: 0,
            data: [0; BLOCKS_PER_INODE],
            size: 0,
        }
    }

    // 新目录：一个引用，只有 . 和 ..
    pub fn new_directory(block: BlockRef) -> Self {
        let mut data = [UNALLOCATED_BLOCK; BLOCKS_PER_INODE];
        data[0] = block;
        Self {
            inode_type: InodeType::Directory.raw(),
            n_references: 1,
            data,
            size: 2,
        }
    }

    // 无法识别的类型按 None 处理
    pub fn inode_type(&self) -> InodeType {
        InodeType::from_raw(self.inode_type).unwrap_or(InodeType::None)
    }

    pub fn set_type(&mut self, inode_type: InodeType) {
        self.inode_type = inode_type.raw();
    }

    pub fn is_dir(&self) -> bool {
        self.inode_type() == InodeType::Directory
    }

    pub fn n_references(&self) -> u8 {
        self.n_references
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub fn data(&self) -> &[BlockRef; BLOCKS_PER_INODE] {
        &self.data
    }

    // 目录内容所在的块
    pub fn first_block(&self) -> BlockRef {
        self.data[0]
    }
}

// 根据inode序号，获取inode所在的块的全局id和块内偏移
pub fn inode_position(inode: InodeRef) -> Result<(BlockRef, usize)> {
    if inode as usize >= N_INODES {
        return Err(FsError::InvalidReference(inode));
    }
    let block_id = inode as usize / INODES_PER_BLOCK + FIRST_INODE_BLOCK as usize;
    let offset = (inode as usize % INODES_PER_BLOCK) * INODE_SIZE;
    Ok((block_id as BlockRef, offset))
}
