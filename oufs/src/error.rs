use crate::layout::{BlockRef, InodeRef};
use alloc::string::String;
use thiserror::Error;

// 错误分类，所有 FsError 都能映射到其中一种
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Structural,
    ResourceExhausted,
    Io,
}

#[derive(Error, Debug)]
pub enum FsError {
    #[error("name '{0}' is too long")]
    NameTooLong(String),
    #[error("name '{0}' contains a NUL byte")]
    InvalidName(String),
    #[error("path '{0}' is too long")]
    PathTooLong(String),
    #[error("'{0}' cannot be used as a target")]
    ReservedName(String),
    #[error("'/' is not a named directory")]
    RootNotNamed,
    #[error("empty path")]
    EmptyPath,
    #[error("{0}: already exists")]
    AlreadyExists(String),
    #[error("{0}: no such file or directory")]
    NotFound(String),
    #[error("improper path name {0}")]
    MissingComponent(String),
    #[error("invalid cwd {0}")]
    InvalidWorkingDirectory(String),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("{0}: directory not empty")]
    DirectoryNotEmpty(String),
    #[error("{0}: not enough space in parent directory")]
    DirectoryFull(String),
    #[error("inode {0} has no type")]
    UnsetInodeType(InodeRef),
    #[error("reference {0} is out of range")]
    InvalidReference(u16),
    #[error("disk is not formatted")]
    NotFormatted,
    #[error("no free inodes")]
    NoFreeInodes,
    #[error("no free blocks")]
    NoFreeBlocks,
    #[error("block {0} is out of range")]
    BlockOutOfRange(BlockRef),
    #[error("incomplete transfer on block {0}")]
    ShortTransfer(BlockRef),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NameTooLong(_)
            | FsError::InvalidName(_)
            | FsError::PathTooLong(_)
            | FsError::ReservedName(_)
            | FsError::RootNotNamed
            | FsError::EmptyPath
            | FsError::AlreadyExists(_) => ErrorKind::Validation,
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::MissingComponent(_)
            | FsError::InvalidWorkingDirectory(_)
            | FsError::NotADirectory(_)
            | FsError::DirectoryNotEmpty(_)
            | FsError::DirectoryFull(_)
            | FsError::UnsetInodeType(_)
            | FsError::InvalidReference(_)
            | FsError::NotFormatted => ErrorKind::Structural,
            FsError::NoFreeInodes | FsError::NoFreeBlocks => ErrorKind::ResourceExhausted,
            FsError::BlockOutOfRange(_) | FsError::ShortTransfer(_) | FsError::Io(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type Result<T> = core::result::Result<T, FsError>;
