use std::collections::{HashMap, HashSet};

use super::Entry;

/// Normalize an archive name into index form
///
/// return None if the entry should not be part of the index
fn normalize(raw: &str) -> Option<String> {
    let is_dir = raw.ends_with('/');
    let trimmed = raw.strip_prefix("./").unwrap_or(raw).trim_start_matches('/');
    let body = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if body.is_empty() {
        log::debug!("skip archive root entry {:?}", raw);
        return None;
    }
    if body
        .split('/')
        .any(|component| component.is_empty() || component == "." || component == "..")
    {
        log::warn!("skip entry with unsafe path: {:?}", raw);
        return None;
    }
    Some(match is_dir {
        true => format!("{}/", body),
        false => body.to_owned(),
    })
}

/// Immutable, ordered list of archive entries
///
/// Built once at mount. Besides the entries in archive order it keeps a map
/// from name(trailing slash stripped) to position, so a lookup never scans the
/// whole archive.
///
/// Building the index guarantees:
/// 1. names are unique, the first entry producing a name wins
/// 2. every ancestor directory of an entry is present, missing ones are
///    synthesized right before the entry needing them
/// 3. a directory recorded later in the archive takes over the slot of its
///    synthesized counterpart, so its position(and inode) doesn't move
#[derive(Debug, Default)]
pub struct EntryIndex {
    entries: Vec<Entry>,
    by_key: HashMap<String, usize>,
    /// positions of directories synthesized and not yet recorded by archive
    synthetic: HashSet<usize>,
}

impl EntryIndex {
    /// build index from entries in archive order
    ///
    /// `dir_perm` is the permission of synthesized directories
    pub fn new(entries: impl IntoIterator<Item = Entry>, dir_perm: u32) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(entry, dir_perm);
        }
        log::debug!("entry index built with {} entries", index.len());
        index
    }
    fn insert(&mut self, mut entry: Entry, dir_perm: u32) {
        let name = match normalize(entry.name()) {
            Some(name) => name,
            None => return,
        };
        entry.rename(name);

        if let Some(&existing) = self.by_key.get(entry.key()) {
            if entry.is_dir() && self.synthetic.remove(&existing) {
                log::trace!("recorded directory {:?} replace synthesized one", entry.name());
                self.entries[existing] = entry;
                return;
            }
            log::warn!(
                "duplicated entry {:?}, keeping {:?}",
                entry.name(),
                self.entries[existing].name()
            );
            return;
        }

        let key = entry.key().to_owned();
        let mut missing = Vec::new();
        for (split, _) in key.match_indices('/') {
            let ancestor = &key[..split];
            match self.by_key.get(ancestor) {
                Some(&idx) if !self.entries[idx].is_dir() => {
                    log::warn!(
                        "entry {:?} is nested under file {:?}, skipped",
                        entry.name(),
                        ancestor
                    );
                    return;
                }
                Some(_) => {}
                None => missing.push(ancestor.to_owned()),
            }
        }
        for ancestor in missing {
            log::trace!("synthesize directory {:?}", ancestor);
            self.synthetic.insert(self.entries.len());
            self.push(Entry::new_dir(ancestor, dir_perm, entry.mtime()));
        }
        self.push(entry);
    }
    fn push(&mut self, entry: Entry) {
        self.by_key.insert(entry.key().to_owned(), self.entries.len());
        self.entries.push(entry);
    }
    /// entries in index order
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
    #[inline]
    pub fn get(&self, position: usize) -> Option<&Entry> {
        self.entries.get(position)
    }
    /// find an entry by name with its trailing slash stripped
    pub fn find(&self, key: &str) -> Option<(usize, &Entry)> {
        self.by_key
            .get(key)
            .map(|&position| (position, &self.entries[position]))
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// sum of uncompressed sizes
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(Entry::size).sum()
    }
}
