//! Tarball support
//!
//! Content in a tar file is never compressed, so a payload is a plain
//! region of the file:
//! | header | content | padding | header | ...

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
    sync::Arc,
    time::{Duration, SystemTime},
};

use tar::{Archive, EntryType};

use super::{
    payload::{open_region, Checked},
    Entry, Payload, DEFAULT_FILE_PERM,
};
use crate::Error;

struct TarPayload {
    path: Arc<Path>,
    start: u64,
    size: u64,
}

impl Payload for TarPayload {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let region = open_region(&self.path, self.start, self.size)?;
        Ok(Box::new(Checked::new(region, self.size, None)))
    }
}

pub fn load(path: &Path) -> Result<Vec<Entry>, Error> {
    let shared: Arc<Path> = Arc::from(path);
    let mut archive = Archive::new(File::open(path)?);
    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let header = entry.header();
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let perm = header.mode().unwrap_or(DEFAULT_FILE_PERM);
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(header.mtime().unwrap_or_default());

        match header.entry_type() {
            EntryType::Directory => entries.push(Entry::new_dir(name, perm, mtime)),
            // old tar writers mark directories by a trailing slash only
            EntryType::Regular | EntryType::Continuous if name.ends_with('/') => {
                entries.push(Entry::new_dir(name, perm, mtime))
            }
            EntryType::Regular | EntryType::Continuous => {
                let payload = TarPayload {
                    path: shared.clone(),
                    start: entry.raw_file_position(),
                    size: entry.size(),
                };
                entries.push(Entry::new_file(
                    name,
                    entry.size(),
                    perm,
                    mtime,
                    Arc::new(payload),
                ));
            }
            x => log::warn!("unsupported entry type {:?} of {:?}", x, name),
        }
    }
    log::info!("read {} entries from tarball {:?}", entries.len(), path);
    Ok(entries)
}
