use super::block_device::BlockDevice;
use super::error::Result;
use super::layout::{BlockRef, BLOCK_SIZE};
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use log::warn;
use spin::Mutex;

const BLOCK_CACHE_LIMIT: usize = 16;

// 块数据按 8 字节对齐，保证可以直接转换成磁盘上的结构体
#[repr(C, align(8))]
pub struct BlockData(pub [u8; BLOCK_SIZE]);

// CacheEntry 一个块缓存项
pub struct CacheEntry {
    block_id: BlockRef,                 // 块id
    modified: bool,                     // 是否被修改
    block_data: BlockData,              // 缓存数据
    block_device: Arc<dyn BlockDevice>, // 块设备接口
}

// BlockCache 属于一个文件系统实例，写操作采用写穿透
pub struct BlockCache {
    cache_map: BTreeMap<BlockRef, Arc<Mutex<CacheEntry>>>,
    block_device: Arc<dyn BlockDevice>,
}

impl BlockCache {
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            cache_map: BTreeMap::new(),
            block_device,
        }
    }

    // 获取一个磁盘块的缓存对象，如果缓存中没有则通过block_device接口读取
    pub fn get_block(&mut self, block_id: BlockRef) -> Result<Arc<Mutex<CacheEntry>>> {
        if let Some(entry) = self.cache_map.get(&block_id) {
            return Ok(Arc::clone(entry));
        }
        // cache已满，弹出没有被使用的entry
        if self.cache_map.len() >= BLOCK_CACHE_LIMIT {
            let idle = self
                .cache_map
                .iter()
                .find(|(_, v)| Arc::strong_count(v) == 1)
                .map(|(id, _)| *id);
            if let Some(id) = idle {
                self.cache_map.remove(&id);
            }
        }
        let mut data = BlockData([0u8; BLOCK_SIZE]);
        self.block_device.read(block_id, &mut data.0)?;
        let entry = Arc::new(Mutex::new(CacheEntry::new(
            block_id,
            data,
            Arc::clone(&self.block_device),
        )));
        self.cache_map.insert(block_id, Arc::clone(&entry));
        Ok(entry)
    }

    // 丢弃一个缓存项，下次访问时重新从设备读取
    pub fn invalidate(&mut self, block_id: BlockRef) {
        self.cache_map.remove(&block_id);
    }
}

impl CacheEntry {
    pub fn new(block_id: BlockRef, data: BlockData, block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            block_id,
            modified: false,
            block_data: data,
            block_device,
        }
    }

    pub fn sync(&mut self) -> Result<()> {
        if self.modified {
            if let Err(e) = self.block_device.write(self.block_id, &self.block_data.0) {
                warn!("write of block {} failed: {}", self.block_id, e);
                return Err(e);
            }
            self.modified = false;
        }
        Ok(())
    }

    fn check_offset<T: Sized>(offset: usize) {
        assert!(
            offset + core::mem::size_of::<T>() <= BLOCK_SIZE,
            "block offset overflow"
        );
        assert!(
            offset % core::mem::align_of::<T>() == 0,
            "block offset misaligned"
        );
    }

    // 从块缓存读取数据并转换成T类型，然后执行F函数从T得到V
    // T 必须是 repr(C) 且任意字节组合都合法的磁盘结构
    pub fn read<T, V, F>(&self, offset: usize, f: F) -> V
    where
        T: Sized,
        F: FnOnce(&T) -> V,
    {
        Self::check_offset::<T>(offset);
        unsafe {
            let ptr = self.block_data.0.as_ptr().add(offset) as *const T;
            f(&*ptr)
        }
    }

    // 从块缓存读取数据并转换成mut T类型，执行函数F处理T并返回，将导致块缓存modified
    pub fn modify<T, V, F>(&mut self, offset: usize, f: F) -> V
    where
        T: Sized,
        F: FnOnce(&mut T) -> V,
    {
        Self::check_offset::<T>(offset);
        self.modified = true;
        unsafe {
            let ptr = self.block_data.0.as_mut_ptr().add(offset) as *mut T;
            f(&mut *ptr)
        }
    }
}

#[cfg(test)]
mod block_cache_tests {
    use super::*;
    use crate::block_device::MemoryBlockDevice;

    #[test]
    fn test_block_entry_read_write() {
        let dev = Arc::new(MemoryBlockDevice::new());
        let mut cache = CacheEntry::new(0, BlockData([0u8; BLOCK_SIZE]), dev.clone());
        cache.modify(0, |data: &mut [u8; BLOCK_SIZE]| {
            data.fill(10);
        });
        assert!(cache.modified, "cache should be modified");
        cache.read(0, |data: &[u8; BLOCK_SIZE]| {
            data.iter().for_each(|d: &u8| {
                assert!(*d == 10, "element should be the modified value");
            });
        });
        cache.sync().unwrap();
        assert!(!cache.modified);
        assert_eq!(dev.snapshot(0), [10u8; BLOCK_SIZE]);
    }

    #[test]
    fn test_cache_evicts_idle_entries() {
        let dev = Arc::new(MemoryBlockDevice::new());
        let mut cache = BlockCache::new(dev);
        let held = cache.get_block(0).unwrap();
        for id in 1..(BLOCK_CACHE_LIMIT as BlockRef + 4) {
            cache.get_block(id).unwrap();
        }
        assert!(cache.cache_map.len() <= BLOCK_CACHE_LIMIT);
        // 正在使用的块不会被淘汰
        assert!(cache.cache_map.contains_key(&0));
        drop(held);
    }

    #[test]
    #[should_panic(expected = "block offset overflow")]
    fn test_offset_overflow() {
        let dev = Arc::new(MemoryBlockDevice::new());
        let cache = CacheEntry::new(0, BlockData([0u8; BLOCK_SIZE]), dev);
        cache.read(BLOCK_SIZE - 2, |v: &u32| *v);
    }
}
