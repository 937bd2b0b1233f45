extern crate alloc;

pub mod bitmap;
pub mod block_cache;
pub mod block_device;
pub mod directory;
pub mod error;
pub mod inode;
pub mod layout;
pub mod master_block;
pub mod oufs;
pub mod path;

pub use block_device::{BlockDevice, FileBlockDevice, MemoryBlockDevice};
pub use error::{ErrorKind, FsError, Result};
pub use oufs::OuFileSystem;
pub use path::Lookup;
