use crate::archive::EntryIndex;

use super::Node;

/// Resolve a child of directory
///
/// `prefix` is the directory's own path(`""` for root). The child is a
/// file if an entry is named `prefix + name`, and a directory if one is
/// named `prefix + name + "/"`. The index keeps one entry per name, so the
/// first of them in archive order is the one found.
pub fn resolve<'a>(index: &'a EntryIndex, prefix: &str, name: &str) -> Option<Node<'a>> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return None;
    }
    let candidate = format!("{}{}", prefix, name);
    index
        .find(&candidate)
        .map(|(position, entry)| Node::new(position, entry))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::mem::{dir, file};

    macro_rules! assert_resolve {
        ($index:expr, $prefix:expr, $name:expr, None) => {
            assert!(resolve(&$index, $prefix, $name).is_none());
        };
        ($index:expr, $prefix:expr, $name:expr, $kind:ident) => {
            assert!(
                matches!(resolve(&$index, $prefix, $name), Some(Node::$kind(..))),
                "resolve({:?}, {:?})",
                $prefix,
                $name
            );
        };
    }

    #[test]
    fn nested_file() {
        let index = EntryIndex::new([file("a/b/c", b"c")], 0o755);

        assert_resolve!(index, "", "a", Directory);
        assert_resolve!(index, "a/", "b", Directory);
        assert_resolve!(index, "a/b/", "c", File);
        assert_resolve!(index, "a/b/", "x", None);
    }
    #[test]
    fn explicit_dir() {
        let index = EntryIndex::new([dir("a/"), file("a/b", b"b"), file("c", b"")], 0o755);

        assert_resolve!(index, "", "a", Directory);
        assert_resolve!(index, "a/", "b", File);
        assert_resolve!(index, "", "c", File);
        // only immediate children are resolved
        assert_resolve!(index, "", "b", None);
    }
    #[test]
    fn reject_bad_name() {
        let index = EntryIndex::new([file("a/b", b"b")], 0o755);

        assert_resolve!(index, "", "a/b", None);
        assert_resolve!(index, "", "", None);
        assert_resolve!(index, "a/", ".", None);
        assert_resolve!(index, "a/", "..", None);
    }
    #[test]
    fn collided_name() {
        let index = EntryIndex::new([dir("a/"), file("a", b"a")], 0o755);
        assert_resolve!(index, "", "a", Directory);

        let index = EntryIndex::new([file("a", b"a"), dir("a/")], 0o755);
        assert_resolve!(index, "", "a", File);
    }
    #[test]
    fn position() {
        let index = EntryIndex::new([file("x", b""), file("y", b"")], 0o755);
        match resolve(&index, "", "y") {
            Some(Node::File(position, entry)) => {
                assert_eq!(position, 1);
                assert_eq!(entry.name(), "y");
            }
            x => panic!("unexpected {:?}", x),
        }
    }
}
