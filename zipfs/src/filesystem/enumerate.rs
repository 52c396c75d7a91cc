use crate::archive::EntryIndex;

/// An immediate child of a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child<'a> {
    pub name: &'a str,
    pub is_dir: bool,
    /// position of the child's entry in index
    pub position: usize,
}

/// List immediate children of the directory with path `prefix`
///
/// Children come in index order. Entries deeper than one level are skipped,
/// and so is the directory's own entry.
pub fn children<'a>(index: &'a EntryIndex, prefix: &'a str) -> impl Iterator<Item = Child<'a>> {
    index
        .entries()
        .iter()
        .enumerate()
        .filter_map(move |(position, entry)| {
            let remainder = entry.name().strip_prefix(prefix)?;
            if remainder.is_empty() {
                return None;
            }
            let (name, is_dir) = match remainder.strip_suffix('/') {
                Some(name) => (name, true),
                None => (remainder, false),
            };
            if name.contains('/') {
                return None;
            }
            Some(Child {
                name,
                is_dir,
                position,
            })
        })
}
