use std::{fmt, io::Read, sync::Arc, time::SystemTime};

/// Something that can hand out fresh, independent readers over an entry's
/// (decompressed) content.
///
/// Every call to [`Payload::open`] must start from the beginning of the
/// content, two readers never share a cursor.
pub trait Payload: Send + Sync {
    fn open(&self) -> std::io::Result<Box<dyn Read + Send>>;
}

/// One record of the archive's flat name table
///
/// Directory names end with `/`, file names don't, and no name starts with `/`.
#[derive(Clone)]
pub struct Entry {
    name: String,
    size: u64,
    mode: u32,
    mtime: SystemTime,
    payload: Option<Arc<dyn Payload>>,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mode", &format_args!("{:o}", self.mode))
            .field("mtime", &self.mtime)
            .finish()
    }
}

impl Entry {
    #[inline]
    pub fn new_file(
        name: impl Into<String>,
        size: u64,
        perm: u32,
        mtime: SystemTime,
        payload: Arc<dyn Payload>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mode: libc::S_IFREG | (perm & 0o7777),
            mtime,
            payload: Some(payload),
        }
    }
    /// `name` gets its trailing slash appended if it's missing
    #[inline]
    pub fn new_dir(name: impl Into<String>, perm: u32, mtime: SystemTime) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        Self {
            name,
            size: 0,
            mode: libc::S_IFDIR | (perm & 0o7777),
            mtime,
            payload: None,
        }
    }
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
    #[inline]
    pub fn mode(&self) -> u32 {
        self.mode
    }
    /// The archive only keeps one timestamp, it doubles as ctime and crtime.
    #[inline]
    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
    /// name without the trailing slash of directories
    pub fn key(&self) -> &str {
        self.name.strip_suffix('/').unwrap_or(&self.name)
    }
    /// open a fresh reader over the content
    ///
    /// Directories have no content and yield [`std::io::ErrorKind::InvalidInput`].
    pub fn open(&self) -> std::io::Result<Box<dyn Read + Send>> {
        match &self.payload {
            Some(payload) => payload.open(),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "directory has no content",
            )),
        }
    }
    pub(super) fn rename(&mut self, name: String) {
        self.name = name;
    }
}
