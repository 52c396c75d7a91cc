use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use super::FuseError;

/// Read cursor of one open file
///
/// Wraps a sequential decompression stream, the stream is the only state:
/// it can't seek, and the offset of a read request is whatever position
/// the stream is currently at.
pub struct StreamHandle {
    stream: Box<dyn Read + Send>,
}

impl StreamHandle {
    pub fn new(stream: Box<dyn Read + Send>) -> Self {
        Self { stream }
    }
    /// Read exactly `size` bytes unless the stream ends first
    ///
    /// The kernel fills page cache with page aligned reads, a short read in
    /// the middle of a file would leave a hole in the cached page. So the
    /// stream is read again and again until the buffer is full, and only a
    /// real end of stream may cut it short.
    ///
    /// End of stream is not an error, the bytes read so far(possibly none)
    /// are returned. Any other failure of the stream is.
    pub fn read(&mut self, size: u32) -> Result<Bytes, FuseError> {
        let mut buf = BytesMut::zeroed(size as usize);
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FuseError::Read(err)),
            }
        }
        buf.truncate(filled);
        Ok(buf.freeze())
    }
    /// close the underlying stream
    pub fn release(self) {
        drop(self.stream);
    }
}
