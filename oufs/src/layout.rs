// 一个磁盘块的大小：256B，整个虚拟磁盘 128 块
pub const BLOCK_SIZE: usize = 256;
pub const N_BLOCKS: usize = 128;
pub const N_INODES: usize = 64;

pub type BlockRef = u16;
pub type InodeRef = u16;

pub const UNALLOCATED_BLOCK: BlockRef = 0xFFFF;
pub const UNALLOCATED_INODE: InodeRef = 0xFFFF;

// block 0: master block, blocks 1..=8: inode table, block 9: root directory
pub const MASTER_BLOCK: BlockRef = 0;
pub const FIRST_INODE_BLOCK: BlockRef = 1;
pub const ROOT_INODE: InodeRef = 0;
pub const ROOT_DIRECTORY_BLOCK: BlockRef = 9;

pub const INODE_SIZE: usize = 32;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
pub const N_INODE_BLOCKS: usize = (N_INODES + INODES_PER_BLOCK - 1) / INODES_PER_BLOCK;
pub const BLOCKS_PER_INODE: usize = 13;

pub const FILE_NAME_SIZE: usize = 14;
// 名字需要保留一个结尾的 NUL
pub const MAX_NAME_LENGTH: usize = FILE_NAME_SIZE - 1;
pub const DIRECTORY_ENTRY_SIZE: usize = 16;
pub const DIRECTORY_ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / DIRECTORY_ENTRY_SIZE;

pub const MAX_PATH_LENGTH: usize = 200;

const _: () = assert!(FIRST_INODE_BLOCK as usize + N_INODE_BLOCKS == ROOT_DIRECTORY_BLOCK as usize);
const _: () = assert!(N_INODE_BLOCKS * INODES_PER_BLOCK >= N_INODES);
