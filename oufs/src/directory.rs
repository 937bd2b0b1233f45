use crate::layout::{
    InodeRef, DIRECTORY_ENTRIES_PER_BLOCK, DIRECTORY_ENTRY_SIZE, FILE_NAME_SIZE, MAX_NAME_LENGTH,
    UNALLOCATED_INODE, BLOCK_SIZE,
};

// 目录条目，名字以 NUL 结尾，未使用的条目指向 UNALLOCATED_INODE
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DirEntry {
    name: [u8; FILE_NAME_SIZE],
    inode: InodeRef,
}

const _: () = assert!(core::mem::size_of::<DirEntry>() == DIRECTORY_ENTRY_SIZE);

impl DirEntry {
    pub fn new(name: &str, inode: InodeRef) -> Self {
        assert!(name.len() <= MAX_NAME_LENGTH, "directory entry name overflow");
        let mut entry = Self::empty();
        entry.name[0..name.len()].copy_from_slice(name.as_bytes());
        entry.inode = inode;
        entry
    }

    pub fn empty() -> Self {
        Self {
            name: [0u8; FILE_NAME_SIZE],
            inode: UNALLOCATED_INODE,
        }
    }

    pub fn name(&self) -> &str {
        let length = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(FILE_NAME_SIZE);
        core::str::from_utf8(&self.name[0..length]).unwrap_or("")
    }

    // 定长的名字字段，用于排序
    pub fn raw_name(&self) -> &[u8; FILE_NAME_SIZE] {
        &self.name
    }

    pub fn inode(&self) -> InodeRef {
        self.inode
    }

    pub fn is_allocated(&self) -> bool {
        self.inode != UNALLOCATED_INODE
    }

    pub fn is_dot(&self) -> bool {
        matches!(self.name(), "." | "..")
    }
}

// 目录的全部内容就是一个块，0号条目是 .，1号条目是 ..
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DirectoryBlock {
    entries: [DirEntry; DIRECTORY_ENTRIES_PER_BLOCK],
}

const _: () = assert!(core::mem::size_of::<DirectoryBlock>() == BLOCK_SIZE);

impl DirectoryBlock {
    // 一个空目录，只有 . 和 ..
    pub fn new(self_inode: InodeRef, parent_inode: InodeRef) -> Self {
        let mut block = Self {
            entries: [DirEntry::empty(); DIRECTORY_ENTRIES_PER_BLOCK],
        };
        block.clean(self_inode, parent_inode);
        block
    }

    pub fn clean(&mut self, self_inode: InodeRef, parent_inode: InodeRef) {
        self.entries.fill(DirEntry::empty());
        self.entries[0] = DirEntry::new(".", self_inode);
        self.entries[1] = DirEntry::new("..", parent_inode);
    }

    // 线性扫描，返回第一个名字相同的条目的inode
    pub fn find(&self, name: &str) -> Option<InodeRef> {
        self.entries
            .iter()
            .find(|entry| entry.is_allocated() && entry.name() == name)
            .map(|entry| entry.inode)
    }

    // 写入第一个空闲的条目，没有空位时返回None
    pub fn insert(&mut self, name: &str, inode: InodeRef) -> Option<usize> {
        let slot = self.free_slot()?;
        self.entries[slot] = DirEntry::new(name, inode);
        Some(slot)
    }

    // 清除名字相同的条目，不做压缩
    pub fn remove(&mut self, name: &str) -> Option<InodeRef> {
        let slot = self
            .entries
            .iter()
            .position(|entry| entry.is_allocated() && entry.name() == name)?;
        let inode = self.entries[slot].inode;
        self.entries[slot] = DirEntry::empty();
        Some(inode)
    }

    pub fn free_slot(&self) -> Option<usize> {
        self.entries.iter().position(|entry| !entry.is_allocated())
    }

    pub fn entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|entry| entry.is_allocated())
    }

    pub fn slot(&self, idx: usize) -> &DirEntry {
        &self.entries[idx]
    }

    // 不包括 . 和 .. 的条目数
    pub fn children(&self) -> usize {
        self.entries().filter(|entry| !entry.is_dot()).count()
    }
}

#[cfg(test)]
mod directory_tests {
    use super::*;

    #[test]
    fn test_clean_block() {
        let block = DirectoryBlock::new(5, 2);
        assert_eq!(block.slot(0).name(), ".");
        assert_eq!(block.slot(0).inode(), 5);
        assert_eq!(block.slot(1).name(), "..");
        assert_eq!(block.slot(1).inode(), 2);
        assert_eq!(block.entries().count(), 2);
        assert_eq!(block.children(), 0);
        assert_eq!(block.find(".."), Some(2));
        assert_eq!(block.find("missing"), None);
    }

    #[test]
    fn test_insert_reuses_first_gap() {
        let mut block = DirectoryBlock::new(0, 0);
        assert_eq!(block.insert("a", 1), Some(2));
        assert_eq!(block.insert("b", 2), Some(3));
        assert_eq!(block.insert("c", 3), Some(4));
        assert_eq!(block.remove("c"), Some(3));
        assert_eq!(block.remove("a"), Some(1));
        // 重用第一个空位，而不是最近释放的
        assert_eq!(block.insert("d", 4), Some(2));
        assert_eq!(block.find("d"), Some(4));
        assert_eq!(block.find("a"), None);
        assert_eq!(block.children(), 2);
    }

    #[test]
    fn test_insert_full_block() {
        let mut block = DirectoryBlock::new(0, 0);
        for i in 2..DIRECTORY_ENTRIES_PER_BLOCK {
            let name = format!("d{}", i);
            assert_eq!(block.insert(&name, i as InodeRef), Some(i));
        }
        assert_eq!(block.insert("extra", 40), None);
        assert_eq!(block.children(), DIRECTORY_ENTRIES_PER_BLOCK - 2);
    }

    #[test]
    fn test_max_length_name() {
        let name = "abcdefghijklm";
        assert_eq!(name.len(), MAX_NAME_LENGTH);
        let entry = DirEntry::new(name, 3);
        assert_eq!(entry.name(), name);
        assert_eq!(entry.raw_name()[MAX_NAME_LENGTH], 0);
    }

    #[test]
    fn test_removed_entry_is_clean() {
        let mut block = DirectoryBlock::new(0, 0);
        block.insert("tmp", 1);
        block.remove("tmp");
        assert_eq!(block, DirectoryBlock::new(0, 0));
    }
}
