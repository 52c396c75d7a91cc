//! Readers handed out by archive entries
//!
//! Every open starts with its own file descriptor positioned at the entry's
//! data, so readers never share a cursor with each other.

use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom, Take},
    path::Path,
};

/// open `len` bytes of `path` starting at `start`
pub fn open_region(path: &Path, start: u64, len: u64) -> io::Result<Take<BufReader<File>>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    Ok(BufReader::new(file).take(len))
}

/// Reader that checks what it yields against the archive's record
///
/// The check runs when the inner reader reports end of stream, so a
/// truncated or corrupted payload surfaces as an error instead of a short
/// file.
pub struct Checked<R: Read> {
    inner: R,
    expected_size: u64,
    expected_crc: Option<u32>,
    read: u64,
    hasher: crc32fast::Hasher,
}

impl<R: Read> Checked<R> {
    pub fn new(inner: R, expected_size: u64, expected_crc: Option<u32>) -> Self {
        Self {
            inner,
            expected_size,
            expected_crc,
            read: 0,
            hasher: crc32fast::Hasher::new(),
        }
    }
    fn verify(&self) -> io::Result<()> {
        if self.read != self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "payload ended after {} of {} bytes",
                    self.read, self.expected_size
                ),
            ));
        }
        if let Some(expected) = self.expected_crc {
            let crc = self.hasher.clone().finalize();
            if crc != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("crc32 mismatch: expect {:08x}, got {:08x}", expected, crc),
                ));
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for Checked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            if !buf.is_empty() {
                self.verify()?;
            }
            return Ok(0);
        }
        self.read += n as u64;
        if self.read > self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("payload longer than {} bytes", self.expected_size),
            ));
        }
        if self.expected_crc.is_some() {
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }
}
