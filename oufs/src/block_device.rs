use crate::error::{FsError, Result};
use crate::layout::{BlockRef, BLOCK_SIZE, N_BLOCKS};
use alloc::vec::Vec;
use spin::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

// 块设备接口，定义从块设备读写数据的方法，每次读写一个完整的块
pub trait BlockDevice: Send + Sync {
    fn read(&self, block_id: BlockRef, data: &mut [u8]) -> Result<()>;
    fn write(&self, block_id: BlockRef, data: &[u8]) -> Result<()>;
}

fn check_range(block_id: BlockRef, len: usize) -> Result<()> {
    if block_id as usize >= N_BLOCKS {
        return Err(FsError::BlockOutOfRange(block_id));
    }
    if len != BLOCK_SIZE {
        return Err(FsError::ShortTransfer(block_id));
    }
    Ok(())
}

// 内存块设备，整个磁盘放在内存中
pub struct MemoryBlockDevice {
    blocks: Mutex<Vec<[u8; BLOCK_SIZE]>>,
}

impl MemoryBlockDevice {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(vec![[0u8; BLOCK_SIZE]; N_BLOCKS]),
        }
    }

    // 直接拷贝一个块的内容，不经过文件系统
    pub fn snapshot(&self, block_id: BlockRef) -> [u8; BLOCK_SIZE] {
        self.blocks.lock()[block_id as usize]
    }
}

impl Default for MemoryBlockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemoryBlockDevice {
    fn read(&self, block_id: BlockRef, data: &mut [u8]) -> Result<()> {
        check_range(block_id, data.len())?;
        data.copy_from_slice(&self.blocks.lock()[block_id as usize]);
        Ok(())
    }

    fn write(&self, block_id: BlockRef, data: &[u8]) -> Result<()> {
        check_range(block_id, data.len())?;
        self.blocks.lock()[block_id as usize].copy_from_slice(data);
        Ok(())
    }
}

// 以宿主机文件作为虚拟磁盘，文件大小固定为 N_BLOCKS * BLOCK_SIZE
pub struct FileBlockDevice(Mutex<File>);

impl FileBlockDevice {
    // 打开已经存在的磁盘镜像
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self(Mutex::new(file)))
    }

    // 创建磁盘镜像，已存在时调整为标准大小
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        file.set_len((N_BLOCKS * BLOCK_SIZE) as u64)?;
        Ok(Self(Mutex::new(file)))
    }
}

impl BlockDevice for FileBlockDevice {
    fn read(&self, block_id: BlockRef, data: &mut [u8]) -> Result<()> {
        check_range(block_id, data.len())?;
        let mut file = self.0.lock();
        file.seek(SeekFrom::Start((block_id as usize * BLOCK_SIZE) as u64))?;
        file.read_exact(data).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => FsError::ShortTransfer(block_id),
            _ => FsError::Io(e),
        })
    }

    fn write(&self, block_id: BlockRef, data: &[u8]) -> Result<()> {
        check_range(block_id, data.len())?;
        let mut file = self.0.lock();
        file.seek(SeekFrom::Start((block_id as usize * BLOCK_SIZE) as u64))?;
        file.write_all(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod block_device_tests {
    use super::*;

    #[test]
    fn test_memory_device_read_write() {
        let dev = MemoryBlockDevice::new();
        let data = [7u8; BLOCK_SIZE];
        dev.write(3, &data).unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        dev.read(3, &mut buf).unwrap();
        assert_eq!(buf, data);
        assert_eq!(dev.snapshot(3), data);
    }

    #[test]
    fn test_out_of_range_block() {
        let dev = MemoryBlockDevice::new();
        let mut buf = [0u8; BLOCK_SIZE];
        let err = dev.read(N_BLOCKS as BlockRef, &mut buf).unwrap_err();
        assert!(matches!(err, FsError::BlockOutOfRange(_)));
        let err = dev.write(3, &buf[..10]).unwrap_err();
        assert!(matches!(err, FsError::ShortTransfer(3)));
    }
}
