//! Filesystem module that is mountable(actually mount and
//! is accessible for user in this operation system)
//!
//! Directory structure is never materialized, every node is derived from
//! the [`crate::archive::EntryIndex`] when the kernel asks for it.

mod adapter;
mod enumerate;
mod handle;
mod node;
mod resolve;
mod tree;

pub use adapter::Filesystem;
pub use handle::StreamHandle;
pub use node::{Attributes, Node, ROOT_INODE};
pub use tree::ArchiveTree;

#[derive(thiserror::Error, Debug)]
pub enum FuseError {
    #[error("no such entry")]
    NotFound,
    #[error("not a readable file")]
    IsDir,
    #[error("not a dir")]
    NotDir,
    #[error("missed inode")]
    InvalidIno,
    #[error("missed handle")]
    HandleNotFound,
    #[error("read only filesystem")]
    ReadOnly,
    #[error("fail to open entry: {0}")]
    Open(std::io::Error),
    #[error("fail to read entry: {0}")]
    Read(std::io::Error),
    #[error("blocking task failed: {0}")]
    Runtime(#[from] tokio::task::JoinError),
}

impl From<FuseError> for fuse3::Errno {
    fn from(value: FuseError) -> Self {
        match value {
            FuseError::NotFound | FuseError::InvalidIno => libc::ENOENT,
            FuseError::IsDir => libc::EISDIR,
            FuseError::NotDir => libc::ENOTDIR,
            FuseError::ReadOnly => libc::EROFS,
            FuseError::HandleNotFound => {
                log::info!("{}", value);
                libc::EBADF
            }
            FuseError::Open(_) | FuseError::Read(_) | FuseError::Runtime(_) => {
                log::warn!("FUSE driver broken: {}", value);
                libc::EIO
            }
        }
        .into()
    }
}
