use std::{
    ffi::{OsStr, OsString},
    future::Future,
    num::NonZeroU32,
    path::Path,
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    filesystem::{ArchiveTree, FuseError, Node, StreamHandle},
    init::config::Fuse,
};

use super::{handle::HandleTable, reply::*};
use fuse3::{
    raw::{reply::*, MountHandle, Request, Session},
    FileType, MountOptions, Result as FuseResult,
};

type VecStream<I> = tokio_stream::Iter<std::vec::IntoIter<I>>;

/// `FOPEN_NONSEEKABLE` of fuse kernel protocol
const FOPEN_NONSEEKABLE: u32 = 1 << 2;
const NAME_MAX: u32 = 255;

pub struct Filesystem {
    tree: ArchiveTree,
    handle_table: HandleTable<Mutex<StreamHandle>>,
    ctx: ReplyCtx,
    allow_other: bool,
    fs_name: String,
}

impl Filesystem {
    pub fn new(tree: ArchiveTree, config: &Fuse, fs_name: impl Into<String>) -> Self {
        Self {
            tree,
            handle_table: HandleTable::new(),
            ctx: ReplyCtx {
                uid: rustix::process::getuid().as_raw(),
                gid: rustix::process::getgid().as_raw(),
                ttl: Duration::from_secs(config.attr_ttl),
                block_size: config.block_size,
            },
            allow_other: config.allow_other,
            fs_name: fs_name.into(),
        }
    }
    pub async fn mount(self, path: impl AsRef<Path>) -> std::io::Result<MountHandle> {
        let mut mount_options = MountOptions::default();

        mount_options
            .uid(self.ctx.uid)
            .gid(self.ctx.gid)
            .read_only(true)
            .fs_name(self.fs_name.clone())
            .allow_other(self.allow_other);

        log::info!("mounting {} on {}", self.fs_name, path.as_ref().display());

        Session::new(mount_options)
            .mount_with_unprivileged(self, path.as_ref())
            .await
    }
    fn lookup_entry(&self, parent: u64, name: &OsStr) -> Result<ReplyEntry, FuseError> {
        let node = self.tree.lookup(parent, name)?;
        let attr = self.tree.attributes(&node);
        Ok(reply_entry(&self.ctx, &attr, node.inode()))
    }
    fn get_attr(&self, inode: u64) -> Result<ReplyAttr, FuseError> {
        let node = self.tree.get(inode)?;
        let attr = self.tree.attributes(&node);
        Ok(reply_attr(&self.ctx, &attr, inode))
    }
    fn stat(&self) -> ReplyStatFs {
        let index = self.tree.index();
        let bsize = self.ctx.block_size.max(1);
        ReplyStatFs {
            blocks: index.total_size().div_ceil(bsize as u64),
            bfree: 0,
            bavail: 0,
            files: index.len() as u64 + 1,
            ffree: 0,
            bsize,
            namelen: NAME_MAX,
            frsize: bsize,
        }
    }
    /// `.` and `..` first, then children in index order
    ///
    /// offset of each entry points to the one after it.
    fn list<'a>(&'a self, inode: u64) -> Result<Vec<(OsString, Node<'a>)>, FuseError> {
        let node = self.tree.get(inode)?;
        let parent = self.tree.parent(&node);
        let mut entries = vec![(OsString::from("."), node), (OsString::from(".."), parent)];
        entries.extend(
            self.tree
                .children(&node)?
                .map(|(name, node)| (OsString::from(name), node)),
        );
        Ok(entries)
    }
    fn read_dir(&self, inode: u64, offset: u64) -> Result<Vec<DirectoryEntry>, FuseError> {
        Ok(self
            .list(inode)?
            .into_iter()
            .enumerate()
            .skip(offset as usize)
            .map(|(i, (name, node))| dir_entry(name, node.kind(), node.inode(), i as i64 + 1))
            .collect())
    }
    fn read_dir_plus(
        &self,
        inode: u64,
        offset: u64,
    ) -> Result<Vec<DirectoryEntryPlus>, FuseError> {
        Ok(self
            .list(inode)?
            .into_iter()
            .enumerate()
            .skip(offset as usize)
            .map(|(i, (name, node))| {
                let attr = self.tree.attributes(&node);
                dir_entry_plus(&self.ctx, name, &attr, node.inode(), i as i64 + 1)
            })
            .collect())
    }
    async fn open_file(&self, inode: u64, flags: u32) -> Result<ReplyOpen, FuseError> {
        if flags as i32 & libc::O_ACCMODE != libc::O_RDONLY {
            return Err(FuseError::ReadOnly);
        }
        let tree = self.tree.clone();
        let handle = tokio::task::spawn_blocking(move || tree.open(inode)).await??;
        let fh = self.handle_table.add(Mutex::new(handle));
        Ok(ReplyOpen {
            fh,
            flags: FOPEN_NONSEEKABLE,
        })
    }
    /// read next chunk of stream, offset of request is ignored
    async fn read_file(&self, fh: u64, size: u32) -> Result<Bytes, FuseError> {
        let handle = self
            .handle_table
            .get(fh)
            .ok_or(FuseError::HandleNotFound)?;
        let mut handle = handle.lock_owned().await;
        tokio::task::spawn_blocking(move || handle.read(size)).await?
    }
    fn release_file(&self, fh: u64) -> Result<(), FuseError> {
        let handle = self
            .handle_table
            .remove(fh)
            .ok_or(FuseError::HandleNotFound)?;
        // an in-flight read still holds the stream, it will be dropped with it
        if let Ok(handle) = Arc::try_unwrap(handle) {
            handle.into_inner().release();
        }
        Ok(())
    }
}

impl fuse3::raw::Filesystem for Filesystem {
    type DirEntryStream<'a>=VecStream<FuseResult<DirectoryEntry>> where Self: 'a;
    type DirEntryPlusStream<'a>=VecStream<FuseResult<DirectoryEntryPlus>> where Self: 'a;

    fn init(&self, _: Request) -> impl Future<Output = FuseResult<ReplyInit>> + Send {
        async move {
            log::debug!("{} entries in archive", self.tree.index().len());
            Ok(ReplyInit {
                max_write: NonZeroU32::new(self.ctx.block_size).unwrap_or(NonZeroU32::MIN),
            })
        }
    }

    fn destroy(&self, _: Request) -> impl Future<Output = ()> + Send {
        async move {
            log::info!("unmounted {}", self.fs_name);
        }
    }

    fn lookup(
        &self,
        _: Request,
        parent: u64,
        name: &OsStr,
    ) -> impl Future<Output = FuseResult<ReplyEntry>> + Send {
        async move {
            log::trace!("lookup {:?} in {}", name, parent);
            Ok(self.lookup_entry(parent, name)?)
        }
    }
    fn forget(&self, _: Request, _: u64, _: u64) -> impl Future<Output = ()> + Send {
        async {}
    }
    fn getattr(
        &self,
        _: Request,
        inode: u64,
        _: Option<u64>,
        _: u32,
    ) -> impl Future<Output = FuseResult<ReplyAttr>> + Send {
        async move { Ok(self.get_attr(inode)?) }
    }
    fn statfs(&self, _: Request, _: u64) -> impl Future<Output = FuseResult<ReplyStatFs>> + Send {
        async move { Ok(self.stat()) }
    }
    fn access(&self, _: Request, _: u64, _: u32) -> impl Future<Output = FuseResult<()>> + Send {
        async { Ok(()) }
    }
    fn open(
        &self,
        _: Request,
        inode: u64,
        flags: u32,
    ) -> impl Future<Output = FuseResult<ReplyOpen>> + Send {
        async move { Ok(self.open_file(inode, flags).await?) }
    }
    fn read(
        &self,
        _: Request,
        _: u64,
        fh: u64,
        _: u64,
        size: u32,
    ) -> impl Future<Output = FuseResult<ReplyData>> + Send {
        async move {
            let data = self.read_file(fh, size).await?;
            Ok(ReplyData { data })
        }
    }
    fn release(
        &self,
        _: Request,
        _: u64,
        fh: u64,
        _: u32,
        _: u64,
        _: bool,
    ) -> impl Future<Output = FuseResult<()>> + Send {
        async move { Ok(self.release_file(fh)?) }
    }
    fn opendir(
        &self,
        _: Request,
        inode: u64,
        _: u32,
    ) -> impl Future<Output = FuseResult<ReplyOpen>> + Send {
        async move {
            let node = self.tree.get(inode)?;
            if node.kind() != FileType::Directory {
                return Err(FuseError::NotDir.into());
            }
            Ok(ReplyOpen { fh: 0, flags: 0 })
        }
    }
    fn releasedir(
        &self,
        _: Request,
        _: u64,
        _: u64,
        _: u32,
    ) -> impl Future<Output = FuseResult<()>> + Send {
        async { Ok(()) }
    }
    fn readdir<'a>(
        &'a self,
        _: Request,
        parent: u64,
        _: u64,
        offset: i64,
    ) -> impl Future<Output = FuseResult<ReplyDirectory<Self::DirEntryStream<'a>>>> + Send {
        async move {
            let entries = self.read_dir(parent, offset.max(0) as u64)?;
            Ok(ReplyDirectory {
                entries: tokio_stream::iter(entries.into_iter().map(Ok).collect::<Vec<_>>()),
            })
        }
    }
    fn readdirplus<'a>(
        &'a self,
        _: Request,
        parent: u64,
        _: u64,
        offset: u64,
        _: u64,
    ) -> impl Future<Output = FuseResult<ReplyDirectoryPlus<Self::DirEntryPlusStream<'a>>>> + Send
    {
        async move {
            let entries = self.read_dir_plus(parent, offset)?;
            Ok(ReplyDirectoryPlus {
                entries: tokio_stream::iter(entries.into_iter().map(Ok).collect::<Vec<_>>()),
            })
        }
    }
}
