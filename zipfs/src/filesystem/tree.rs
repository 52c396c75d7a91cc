use std::{ffi::OsStr, sync::Arc};

use crate::archive::EntryIndex;

use super::{
    enumerate::{children, Child},
    resolve::resolve,
    Attributes, FuseError, Node, StreamHandle,
};

/// Virtual directory tree over an archive
///
/// It holds nothing but the shared, immutable index, so cloning is cheap
/// and every method is safe to call from concurrent requests.
#[derive(Clone)]
pub struct ArchiveTree {
    index: Arc<EntryIndex>,
    root_perm: u16,
}

impl ArchiveTree {
    pub fn new(index: EntryIndex, root_perm: u16) -> Self {
        Self {
            index: Arc::new(index),
            root_perm,
        }
    }
    #[inline]
    pub fn index(&self) -> &EntryIndex {
        &self.index
    }
    /// get a node by inode
    pub fn get(&self, inode: u64) -> Result<Node<'_>, FuseError> {
        match Node::position_of(inode) {
            None if inode == super::ROOT_INODE => Ok(Node::Root),
            None => Err(FuseError::InvalidIno),
            Some(position) => self
                .index
                .get(position)
                .map(|entry| Node::new(position, entry))
                .ok_or(FuseError::InvalidIno),
        }
    }
    #[inline]
    pub fn attributes(&self, node: &Node<'_>) -> Attributes {
        node.attributes(self.root_perm)
    }
    /// look up a child by name in directory `parent`
    pub fn lookup(&self, parent: u64, name: &OsStr) -> Result<Node<'_>, FuseError> {
        let parent = self.get(parent)?;
        let prefix = parent.prefix().ok_or(FuseError::NotDir)?;
        let name = name.to_str().ok_or(FuseError::NotFound)?;
        resolve(&self.index, prefix, name).ok_or(FuseError::NotFound)
    }
    /// list immediate children of directory
    pub fn children<'a>(
        &'a self,
        node: &Node<'a>,
    ) -> Result<impl Iterator<Item = (&'a str, Node<'a>)>, FuseError> {
        let prefix = node.prefix().ok_or(FuseError::NotDir)?;
        let index: &'a EntryIndex = &self.index;
        Ok(
            children(index, prefix).map(move |Child { name, position, .. }| {
                (name, Node::new(position, &index.entries()[position]))
            }),
        )
    }
    /// parent directory of a node, root is its own parent
    pub fn parent<'a>(&'a self, node: &Node<'a>) -> Node<'a> {
        node.entry()
            .and_then(|entry| entry.key().rsplit_once('/'))
            .and_then(|(parent, _)| self.index.find(parent))
            .map(|(position, entry)| Node::new(position, entry))
            .unwrap_or(Node::Root)
    }
    /// Open a fresh stream over the content of file
    ///
    /// It does blocking IO, call it from a blocking context.
    pub fn open(&self, inode: u64) -> Result<StreamHandle, FuseError> {
        match self.get(inode)? {
            Node::File(_, entry) => {
                log::debug!("open {:?}", entry.name());
                entry
                    .open()
                    .map(StreamHandle::new)
                    .map_err(FuseError::Open)
            }
            _ => Err(FuseError::IsDir),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::mem::{dir, file, unopenable};
    use fuse3::FileType;

    macro_rules! lookup {
        ($tree:expr, $path:expr) => {{
            let mut node = Node::Root;
            for name in $path.split('/') {
                node = $tree.lookup(node.inode(), OsStr::new(name)).unwrap();
            }
            node
        }};
    }

    fn tree() -> ArchiveTree {
        ArchiveTree::new(
            EntryIndex::new(
                [
                    dir("nest/"),
                    file("nest/a.txt", b"a"),
                    file("nest/deep/b.txt", b"b"),
                    file("o.txt", b"hello world"),
                ],
                0o755,
            ),
            0o700,
        )
    }

    #[test]
    fn root() {
        let tree = tree();
        let root = tree.get(crate::filesystem::ROOT_INODE).unwrap();
        assert!(matches!(root, Node::Root));
        assert_eq!(tree.attributes(&root).perm, 0o700);

        let empty = ArchiveTree::new(EntryIndex::new(Vec::new(), 0o755), 0o755);
        let root = empty.get(crate::filesystem::ROOT_INODE).unwrap();
        assert_eq!(empty.attributes(&root).kind, FileType::Directory);
        assert_eq!(empty.children(&root).unwrap().count(), 0);
    }
    #[test]
    fn lookup_nested() {
        let tree = tree();
        assert_eq!(lookup!(tree, "nest").kind(), FileType::Directory);
        assert_eq!(lookup!(tree, "nest/deep").kind(), FileType::Directory);
        assert_eq!(lookup!(tree, "nest/deep/b.txt").kind(), FileType::RegularFile);
        assert_eq!(tree.attributes(&lookup!(tree, "o.txt")).size, 11);
    }
    #[test]
    fn lookup_miss() {
        let tree = tree();
        let nest = lookup!(tree, "nest");
        assert!(matches!(
            tree.lookup(nest.inode(), OsStr::new("o.txt")),
            Err(FuseError::NotFound)
        ));
        let file = lookup!(tree, "o.txt");
        assert!(matches!(
            tree.lookup(file.inode(), OsStr::new("x")),
            Err(FuseError::NotDir)
        ));
        assert!(matches!(
            tree.lookup(9999, OsStr::new("x")),
            Err(FuseError::InvalidIno)
        ));
    }
    #[test]
    fn inode_roundtrip() {
        let tree = tree();
        let node = lookup!(tree, "nest/deep/b.txt");
        let again = tree.get(node.inode()).unwrap();
        assert_eq!(again.entry().unwrap().name(), "nest/deep/b.txt");
        assert!(matches!(tree.get(0), Err(FuseError::InvalidIno)));
    }
    #[test]
    fn list_children() {
        let tree = tree();
        let nest = lookup!(tree, "nest");
        let names = tree
            .children(&nest)
            .unwrap()
            .map(|(name, node)| (name, node.kind()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![("a.txt", FileType::RegularFile), ("deep", FileType::Directory)]
        );
        let file = lookup!(tree, "o.txt");
        assert!(matches!(tree.children(&file), Err(FuseError::NotDir)));
    }
    #[test]
    fn parent() {
        let tree = tree();
        let deep = lookup!(tree, "nest/deep");
        assert_eq!(tree.parent(&deep).inode(), lookup!(tree, "nest").inode());
        let nest = lookup!(tree, "nest");
        assert!(matches!(tree.parent(&nest), Node::Root));
        assert!(matches!(tree.parent(&Node::Root), Node::Root));
    }
    #[test]
    fn open_independent() {
        let tree = tree();
        let inode = lookup!(tree, "o.txt").inode();
        let mut first = tree.open(inode).unwrap();
        let mut second = tree.open(inode).unwrap();

        assert_eq!(&first.read(5).unwrap()[..], b"hello");
        assert_eq!(&second.read(11).unwrap()[..], b"hello world");
        assert_eq!(&first.read(100).unwrap()[..], b" world");
        first.release();
        second.release();

        let nest = lookup!(tree, "nest").inode();
        assert!(matches!(tree.open(nest), Err(FuseError::IsDir)));
    }
    #[test]
    fn open_failure_is_per_entry() {
        let tree = ArchiveTree::new(
            EntryIndex::new([unopenable("bad.bin", 42), file("ok.txt", b"ok")], 0o755),
            0o755,
        );
        let bad = lookup!(tree, "bad.bin");
        assert_eq!(tree.attributes(&bad).size, 42);
        match tree.open(bad.inode()) {
            Err(err @ FuseError::Open(_)) => {
                assert_eq!(fuse3::Errno::from(err), fuse3::Errno::from(libc::EIO))
            }
            Err(err) => panic!("unexpected error {}", err),
            Ok(_) => panic!("unopenable entry opened"),
        }

        let mut ok = tree.open(lookup!(tree, "ok.txt").inode()).unwrap();
        assert_eq!(&ok.read(4096).unwrap()[..], b"ok");
    }
}
