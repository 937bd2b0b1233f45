use crate::block_cache::BlockCache;
use crate::block_device::BlockDevice;
use crate::directory::DirectoryBlock;
use crate::error::{FsError, Result};
use crate::inode::{inode_position, DiskInode, InodeType};
use crate::layout::{
    BlockRef, InodeRef, BLOCK_SIZE, DIRECTORY_ENTRIES_PER_BLOCK, MASTER_BLOCK, MAX_NAME_LENGTH,
    N_BLOCKS, ROOT_DIRECTORY_BLOCK, ROOT_INODE,
};
use crate::master_block::MasterBlock;
use crate::path::{self, DirectoryReader, Lookup};
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use log::{debug, info, warn};
use spin::Mutex;

pub struct OuFileSystem {
    pub block_dev: Arc<dyn BlockDevice>,
    cache: Mutex<BlockCache>,
}

impl OuFileSystem {
    fn mount(block_dev: Arc<dyn BlockDevice>) -> Self {
        Self {
            cache: Mutex::new(BlockCache::new(Arc::clone(&block_dev))),
            block_dev,
        }
    }

    // 在块设备上创建一个文件系统
    pub fn format(block_dev: Arc<dyn BlockDevice>) -> Result<Self> {
        let fs = Self::mount(block_dev);
        // 清空整个磁盘
        for i in 0..N_BLOCKS {
            fs.modify_block(i as BlockRef, 0, |data: &mut [u8; BLOCK_SIZE]| {
                data.fill(0);
            })?;
        }
        fs.write_master(&MasterBlock::formatted())?;
        fs.write_inode(ROOT_INODE, &DiskInode::new_directory(ROOT_DIRECTORY_BLOCK))?;
        fs.write_directory(
            ROOT_DIRECTORY_BLOCK,
            &DirectoryBlock::new(ROOT_INODE, ROOT_INODE),
        )?;
        info!("formatted disk: {} blocks of {} bytes", N_BLOCKS, BLOCK_SIZE);
        Ok(fs)
    }

    // 从块设备上打开文件系统，根 inode 必须是目录
    pub fn open(block_dev: Arc<dyn BlockDevice>) -> Result<Self> {
        let fs = Self::mount(block_dev);
        if !fs.read_inode(ROOT_INODE)?.is_dir() {
            return Err(FsError::NotFormatted);
        }
        Ok(fs)
    }

    fn read_block<T, V, F>(&self, block_id: BlockRef, offset: usize, f: F) -> Result<V>
    where
        F: FnOnce(&T) -> V,
    {
        let entry = self.cache.lock().get_block(block_id)?;
        let value = entry.lock().read(offset, f);
        Ok(value)
    }

    // 修改块缓存并立即写回设备，写失败时丢弃缓存，保证缓存和磁盘一致
    fn modify_block<T, V, F>(&self, block_id: BlockRef, offset: usize, f: F) -> Result<V>
    where
        F: FnOnce(&mut T) -> V,
    {
        let entry = self.cache.lock().get_block(block_id)?;
        let mut guard = entry.lock();
        let value = guard.modify(offset, f);
        let synced = guard.sync();
        drop(guard);
        if let Err(e) = synced {
            self.cache.lock().invalidate(block_id);
            return Err(e);
        }
        Ok(value)
    }

    pub fn master_block(&self) -> Result<MasterBlock> {
        self.read_block(MASTER_BLOCK, 0, |master: &MasterBlock| *master)
    }

    fn write_master(&self, master: &MasterBlock) -> Result<()> {
        self.modify_block(MASTER_BLOCK, 0, |slot: &mut MasterBlock| *slot = *master)
    }

    pub fn read_inode(&self, inode: InodeRef) -> Result<DiskInode> {
        let (block_id, offset) = inode_position(inode)?;
        debug!("fetching inode {}", inode);
        self.read_block(block_id, offset, |disk_inode: &DiskInode| *disk_inode)
    }

    pub fn write_inode(&self, inode: InodeRef, disk_inode: &DiskInode) -> Result<()> {
        let (block_id, offset) = inode_position(inode)?;
        debug!("writing inode {}", inode);
        self.modify_block(block_id, offset, |slot: &mut DiskInode| *slot = *disk_inode)
    }

    pub fn read_directory(&self, block_id: BlockRef) -> Result<DirectoryBlock> {
        self.read_block(block_id, 0, |dir: &DirectoryBlock| *dir)
    }

    fn write_directory(&self, block_id: BlockRef, dir: &DirectoryBlock) -> Result<()> {
        self.modify_block(block_id, 0, |slot: &mut DirectoryBlock| *slot = *dir)
    }

    fn zero_block(&self, block_id: BlockRef) -> Result<()> {
        self.modify_block(block_id, 0, |data: &mut [u8; BLOCK_SIZE]| data.fill(0))
    }

    // 目录 inode 的内容块
    fn directory_block_of(&self, disk_inode: &DiskInode) -> Result<BlockRef> {
        let block_id = disk_inode.first_block();
        if block_id as usize >= N_BLOCKS {
            return Err(FsError::InvalidReference(block_id));
        }
        Ok(block_id)
    }

    // 在目录 inode 的内容块中按名字查找
    pub fn find_by_name(&self, dir_inode: &DiskInode, name: &str) -> Result<Option<InodeRef>> {
        let block_id = self.directory_block_of(dir_inode)?;
        Ok(self.read_directory(block_id)?.find(name))
    }

    pub fn find<'p>(&self, cwd: &str, path: &'p str) -> Result<Lookup<'p>> {
        path::resolve(self, cwd, path)
    }

    pub fn mkdir(&self, cwd: &str, path: &str) -> Result<InodeRef> {
        let (parent, name) = match self.find(cwd, path)? {
            Lookup::Found { .. } => return Err(FsError::AlreadyExists(path.to_string())),
            Lookup::NotFound { parent, name } => (parent, name),
        };
        if name.len() > MAX_NAME_LENGTH {
            return Err(FsError::NameTooLong(name.to_string()));
        }
        // 名字字段以 NUL 结尾，名字中间的 NUL 会截断名字
        if name.contains('\0') {
            return Err(FsError::InvalidName(name.to_string()));
        }
        let mut parent_inode = self.read_inode(parent)?;
        if parent_inode.size() as usize >= DIRECTORY_ENTRIES_PER_BLOCK {
            return Err(FsError::DirectoryFull(path.to_string()));
        }
        let parent_block = self.directory_block_of(&parent_inode)?;
        let mut parent_dir = self.read_directory(parent_block)?;
        if parent_dir.free_slot().is_none() {
            return Err(FsError::DirectoryFull(path.to_string()));
        }

        // 先分配 inode 和块，两者都成功才写回 master 块
        let mut master = self.master_block()?;
        let child = master.alloc_inode()?;
        let child_block = master.alloc_block()?;
        debug!("allocated inode {} and block {}", child, child_block);

        // 写入顺序：master，父 inode，父目录块，新目录块，新 inode
        // 中途失败时新目录要么完全不可见，要么只是泄漏了分配位
        self.write_master(&master)?;
        parent_inode.set_size(parent_inode.size() + 1);
        self.write_inode(parent, &parent_inode)?;
        parent_dir
            .insert(name, child)
            .ok_or_else(|| FsError::DirectoryFull(path.to_string()))?;
        self.write_directory(parent_block, &parent_dir)?;
        self.write_directory(child_block, &DirectoryBlock::new(child, parent))?;
        self.write_inode(child, &DiskInode::new_directory(child_block))?;
        info!("mkdir {}: inode {}, block {}", path, child, child_block);
        Ok(child)
    }

    pub fn rmdir(&self, cwd: &str, path: &str) -> Result<()> {
        let name = match path::last_component(path) {
            Some(name) if name == "." || name == ".." => {
                return Err(FsError::ReservedName(name.to_string()))
            }
            Some(name) => name,
            None if path.is_empty() => return Err(FsError::EmptyPath),
            None => return Err(FsError::RootNotNamed),
        };
        let (parent, child) = match self.find(cwd, path)? {
            Lookup::Found { parent, child } => (parent, child),
            Lookup::NotFound { .. } => return Err(FsError::NotFound(path.to_string())),
        };
        if child == ROOT_INODE {
            return Err(FsError::RootNotNamed);
        }
        let child_inode = self.read_inode(child)?;
        if !child_inode.is_dir() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        if child_inode.size() != 2 {
            return Err(FsError::DirectoryNotEmpty(path.to_string()));
        }
        let child_block = self.directory_block_of(&child_inode)?;
        let mut parent_inode = self.read_inode(parent)?;
        let parent_block = self.directory_block_of(&parent_inode)?;
        let mut parent_dir = self.read_directory(parent_block)?;
        if parent_dir.remove(name).is_none() {
            warn!("{} vanished from directory block {}", name, parent_block);
            return Err(FsError::NotFound(path.to_string()));
        }

        // 写入顺序：父 inode，父目录块，子 inode，子目录块，master
        parent_inode.set_size(parent_inode.size().saturating_sub(1));
        self.write_inode(parent, &parent_inode)?;
        self.write_directory(parent_block, &parent_dir)?;
        self.write_inode(child, &DiskInode::empty())?;
        self.zero_block(child_block)?;

        let mut master = self.master_block()?;
        if master.inode_allocated(child) {
            master.dealloc_inode(child);
        } else {
            warn!("inode {} was not marked allocated", child);
        }
        if master.block_allocated(child_block) {
            master.dealloc_block(child_block);
        } else {
            warn!("block {} was not marked allocated", child_block);
        }
        self.write_master(&master)?;
        debug!("released inode {} and block {}", child, child_block);
        info!("rmdir {}", path);
        Ok(())
    }

    // 列出目录内容（不包括 . 和 ..），目录名后面加 /；普通文件只输出自己的名字
    pub fn list(&self, cwd: &str, path: Option<&str>) -> Result<Vec<String>> {
        self.list_entries(cwd, path.unwrap_or("."), false)
    }

    // 和 list 相同，但是包括 . 和 ..
    pub fn list_all(&self, cwd: &str, path: Option<&str>) -> Result<Vec<String>> {
        self.list_entries(cwd, path.unwrap_or("."), true)
    }

    fn list_entries(&self, cwd: &str, path: &str, with_dots: bool) -> Result<Vec<String>> {
        // 根目录直接使用 0 号 inode
        let target = if !path.is_empty() && path::tokenize(path).is_empty() {
            ROOT_INODE
        } else {
            match self.find(cwd, path)? {
                Lookup::Found { child, .. } => child,
                Lookup::NotFound { .. } => return Err(FsError::NotFound(path.to_string())),
            }
        };
        let disk_inode = self.read_inode(target)?;
        match disk_inode.inode_type() {
            InodeType::None => Err(FsError::UnsetInodeType(target)),
            InodeType::File => {
                let name = path::last_component(path).unwrap_or(path);
                Ok(vec![name.to_string()])
            }
            InodeType::Directory => {
                let dir = self.read_directory(self.directory_block_of(&disk_inode)?)?;
                let mut entries: Vec<_> = dir
                    .entries()
                    .filter(|entry| with_dots || !entry.is_dot())
                    .collect();
                entries.sort_by(|a, b| a.raw_name().cmp(b.raw_name()));
                let mut names = Vec::with_capacity(entries.len());
                for entry in entries {
                    let mut name = entry.name().to_string();
                    if self.read_inode(entry.inode())?.is_dir() {
                        name.push('/');
                    }
                    names.push(name);
                }
                Ok(names)
            }
        }
    }
}

impl DirectoryReader for OuFileSystem {
    fn lookup(&self, dir: InodeRef, name: &str) -> Result<Option<InodeRef>> {
        let dir_inode = self.read_inode(dir)?;
        if !dir_inode.is_dir() {
            return Err(FsError::NotADirectory(format!("inode {}", dir)));
        }
        self.find_by_name(&dir_inode, name)
    }
}
