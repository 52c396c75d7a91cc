use std::{
    fs::File,
    io::{self, Read},
    path::Path,
    sync::Arc,
    time::SystemTime,
};

use chrono::{NaiveDate, TimeZone, Utc};
use zip::{CompressionMethod, DateTime, ZipArchive};

use super::{
    payload::{open_region, Checked},
    Entry, Payload, DEFAULT_DIR_PERM, DEFAULT_FILE_PERM,
};
use crate::Error;

/// Compressed data of one zip member, located by its offset in the archive
///
/// Each open gets a new file descriptor and a new decoder, the central
/// directory is parsed only once at mount.
struct ZipPayload {
    path: Arc<Path>,
    data_start: u64,
    compressed_size: u64,
    size: u64,
    crc32: u32,
    method: CompressionMethod,
}

impl Payload for ZipPayload {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let region = open_region(&self.path, self.data_start, self.compressed_size)?;
        let decoded: Box<dyn Read + Send> = match self.method {
            CompressionMethod::Stored => Box::new(region),
            CompressionMethod::Deflated => Box::new(flate2::bufread::DeflateDecoder::new(region)),
            CompressionMethod::Zstd => Box::new(zstd::stream::read::Decoder::with_buffer(region)?),
            method => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported compression method {:?}", method),
                ))
            }
        };
        Ok(Box::new(Checked::new(decoded, self.size, Some(self.crc32))))
    }
}

fn is_supported(method: CompressionMethod) -> bool {
    matches!(
        method,
        CompressionMethod::Stored | CompressionMethod::Deflated | CompressionMethod::Zstd
    )
}

/// MS-DOS timestamps carry no zone, they are read as UTC
fn to_system_time(time: DateTime) -> SystemTime {
    NaiveDate::from_ymd_opt(time.year() as i32, time.month() as u32, time.day() as u32)
        .and_then(|date| {
            date.and_hms_opt(time.hour() as u32, time.minute() as u32, time.second() as u32)
        })
        .map(|naive| Utc.from_utc_datetime(&naive).into())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// read the central directory of a zip file
pub fn load(path: &Path) -> Result<Vec<Entry>, Error> {
    let shared: Arc<Path> = Arc::from(path);
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entries = Vec::with_capacity(archive.len());

    for idx in 0..archive.len() {
        let file = archive.by_index_raw(idx)?;
        let name = file.name().to_owned();
        let mtime = to_system_time(file.last_modified());
        let mode = file.unix_mode();

        if file.is_dir() {
            let perm = mode.unwrap_or(DEFAULT_DIR_PERM);
            entries.push(Entry::new_dir(name, perm, mtime));
            continue;
        }
        if mode.is_some_and(|mode| mode & libc::S_IFMT == libc::S_IFLNK) {
            log::warn!("symlink {:?} is not supported, skipped", name);
            continue;
        }
        if !is_supported(file.compression()) {
            log::warn!(
                "entry {:?} use unsupported compression method {:?}",
                name,
                file.compression()
            );
        }

        let payload = ZipPayload {
            path: shared.clone(),
            data_start: file.data_start(),
            compressed_size: file.compressed_size(),
            size: file.size(),
            crc32: file.crc32(),
            method: file.compression(),
        };
        entries.push(Entry::new_file(
            name,
            file.size(),
            mode.unwrap_or(DEFAULT_FILE_PERM),
            mtime,
            Arc::new(payload),
        ));
    }
    log::info!("read {} entries from zip {:?}", entries.len(), path);
    Ok(entries)
}
