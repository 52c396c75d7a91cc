use std::{
    ffi::OsString,
    time::{Duration, SystemTime},
};

use fuse3::{
    raw::reply::*,
    FileType, Timestamp,
};

use crate::filesystem::Attributes;

/// owner and cache setting shared by every reply
#[derive(Debug, Clone, Copy)]
pub struct ReplyCtx {
    pub uid: u32,
    pub gid: u32,
    pub ttl: Duration,
    pub block_size: u32,
}

fn timestamp(time: SystemTime) -> Timestamp {
    let since_epoch = time
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    Timestamp::new(since_epoch.as_secs() as i64, since_epoch.subsec_nanos())
}

pub fn file_attr(ctx: &ReplyCtx, attr: &Attributes, inode: u64) -> FileAttr {
    FileAttr {
        ino: inode,
        size: attr.size,
        blocks: attr.size.div_ceil(512),
        atime: timestamp(attr.mtime),
        mtime: timestamp(attr.mtime),
        ctime: timestamp(attr.ctime),
        kind: attr.kind,
        perm: attr.perm,
        nlink: match attr.kind {
            FileType::Directory => 2,
            _ => 1,
        },
        uid: ctx.uid,
        gid: ctx.gid,
        rdev: 0,
        blksize: ctx.block_size,
    }
}

pub fn reply_attr(ctx: &ReplyCtx, attr: &Attributes, inode: u64) -> ReplyAttr {
    ReplyAttr {
        ttl: ctx.ttl,
        attr: file_attr(ctx, attr, inode),
    }
}

pub fn reply_entry(ctx: &ReplyCtx, attr: &Attributes, inode: u64) -> ReplyEntry {
    ReplyEntry {
        ttl: ctx.ttl,
        attr: file_attr(ctx, attr, inode),
        generation: 0,
    }
}

pub fn dir_entry(name: OsString, kind: FileType, inode: u64, offset: i64) -> DirectoryEntry {
    DirectoryEntry {
        inode,
        kind,
        name,
        offset,
    }
}

pub fn dir_entry_plus(
    ctx: &ReplyCtx,
    name: OsString,
    attr: &Attributes,
    inode: u64,
    offset: i64,
) -> DirectoryEntryPlus {
    DirectoryEntryPlus {
        inode,
        generation: 0,
        kind: attr.kind,
        name,
        offset,
        attr: file_attr(ctx, attr, inode),
        entry_ttl: ctx.ttl,
        attr_ttl: ctx.ttl,
    }
}
