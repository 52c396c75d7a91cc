//! Archive side of the filesystem
//!
//! Loaders turn an archive on disk into a flat list of [`Entry`], which is
//! then frozen into an [`EntryIndex`] for the whole lifetime of the mount.

mod entry;
mod index;
mod payload;
mod tarball;
mod zipfile;

pub use entry::{Entry, Payload};
pub use index::EntryIndex;

#[cfg(test)]
pub use entry::mem;

use std::path::Path;

use ::zip::result::ZipError;

use crate::Error;

/// permission of files when the archive doesn't record one
pub const DEFAULT_FILE_PERM: u32 = 0o644;
/// permission of directories when the archive doesn't record one
pub const DEFAULT_DIR_PERM: u32 = 0o755;

/// Load an archive into an index
///
/// The format is detected by content: anything with a zip central directory
/// is a zip, everything else is tried as a tarball.
///
/// It does blocking IO, call it from a blocking context.
pub fn load(path: &Path, dir_perm: u32) -> Result<EntryIndex, Error> {
    let entries = match zipfile::load(path) {
        Ok(entries) => entries,
        Err(Error::Zip(ZipError::InvalidArchive(reason))) => {
            log::debug!("{:?} is not a zip file({}), try tarball", path, reason);
            tarball::load(path)?
        }
        Err(err) => return Err(err),
    };
    Ok(EntryIndex::new(entries, dir_perm))
}
