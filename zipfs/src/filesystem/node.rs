use std::time::SystemTime;

use fuse3::FileType;

use crate::archive::Entry;

/// inode of the implicit root directory
pub const ROOT_INODE: u64 = 1;
/// inode of the first entry in index
const ENTRY_INODE_BASE: u64 = 2;

/// Attributes of a node, before the transport adds inode and ownership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    pub kind: FileType,
    pub size: u64,
    pub perm: u16,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    /// creation time, only macOS reports it, `FileAttr` on Linux has no such field
    pub crtime: SystemTime,
}

/// A node on the virtual tree
///
/// Nodes are cheap views into the index, the position of the entry is
/// the only identity they carry.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Root,
    Directory(usize, &'a Entry),
    File(usize, &'a Entry),
}

impl<'a> Node<'a> {
    /// wrap the entry at `position` of index
    #[inline]
    pub fn new(position: usize, entry: &'a Entry) -> Self {
        match entry.is_dir() {
            true => Self::Directory(position, entry),
            false => Self::File(position, entry),
        }
    }
    /// convert inode back to position in index
    ///
    /// return None for the root inode
    #[inline]
    pub fn position_of(inode: u64) -> Option<usize> {
        inode
            .checked_sub(ENTRY_INODE_BASE)
            .and_then(|x| usize::try_from(x).ok())
    }
    pub fn inode(&self) -> u64 {
        match self {
            Self::Root => ROOT_INODE,
            Self::Directory(position, _) | Self::File(position, _) => {
                *position as u64 + ENTRY_INODE_BASE
            }
        }
    }
    pub fn entry(&self) -> Option<&'a Entry> {
        match self {
            Self::Root => None,
            Self::Directory(_, entry) | Self::File(_, entry) => Some(entry),
        }
    }
    #[inline]
    pub fn kind(&self) -> FileType {
        match self {
            Self::Root | Self::Directory(..) => FileType::Directory,
            Self::File(..) => FileType::RegularFile,
        }
    }
    /// path prefix of the directory's children
    ///
    /// return None if the node is a file
    pub fn prefix(&self) -> Option<&'a str> {
        match self {
            Self::Root => Some(""),
            Self::Directory(_, entry) => Some(entry.name()),
            Self::File(..) => None,
        }
    }
    /// Synthesize attributes
    ///
    /// Root has no entry behind it, it's a directory with `root_perm` and zero
    /// size and timestamps. Directories report the size stored in archive
    /// rather than anything about their descendants.
    pub fn attributes(&self, root_perm: u16) -> Attributes {
        match self.entry() {
            None => Attributes {
                kind: FileType::Directory,
                size: 0,
                perm: root_perm,
                mtime: SystemTime::UNIX_EPOCH,
                ctime: SystemTime::UNIX_EPOCH,
                crtime: SystemTime::UNIX_EPOCH,
            },
            Some(entry) => Attributes {
                kind: self.kind(),
                size: entry.size(),
                perm: (entry.mode() & 0o7777) as u16,
                mtime: entry.mtime(),
                ctime: entry.mtime(),
                crtime: entry.mtime(),
            },
        }
    }
}
