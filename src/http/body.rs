//! Message bodies held in memory or backed by a readable resource.

use std::{
    fmt,
    fs::{self, File},
    io::{self, Cursor, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// A readable source behind a streamed [`Body`].
///
/// Each body owns its resource exclusively. Cloning a body calls
/// [`Resource::duplicate`], which must hand back an independent reader
/// positioned where this one currently is, so two messages never share a cursor.
pub trait Resource: Read + Send + Sync + fmt::Debug {
    /// Total length in bytes, or `None` when it cannot be known up front.
    fn size(&self) -> Option<u64>;

    fn duplicate(&self) -> Box<dyn Resource>;
}

impl Resource for Cursor<Vec<u8>> {
    #[inline]
    fn size(&self) -> Option<u64> {
        Some(self.get_ref().len() as u64)
    }

    #[inline]
    fn duplicate(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }
}

/// A file on disk, opened lazily and re-opened for every duplicate.
#[derive(Debug)]
pub struct FileResource {
    path: PathBuf,
    position: u64,
    file: Option<File>,
}

impl FileResource {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        Ok(Self {
            path,
            position: 0,
            file: Some(file),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for FileResource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let file = match &mut self.file {
            Some(file) => file,
            slot @ None => {
                let mut file = File::open(&self.path)?;
                file.seek(SeekFrom::Start(self.position))?;
                slot.insert(file)
            }
        };

        let read = file.read(buf)?;
        self.position += read as u64;
        Ok(read)
    }
}

impl Resource for FileResource {
    fn size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|meta| meta.len())
    }

    fn duplicate(&self) -> Box<dyn Resource> {
        Box::new(Self {
            path: self.path.clone(),
            position: self.position,
            file: None,
        })
    }
}

/// The body of a [`Message`](crate::Message).
///
/// Either an in-memory buffer or a streamed [`Resource`]. Both read forward
/// through an internal cursor; [`Body::size`] tells whether the length is known
/// (`Content-Length`) or not (`Transfer-Encoding: chunked`).
///
/// # Examples
/// ```
/// use http_value::Body;
///
/// let mut body = Body::from("Hello, world");
///
/// assert_eq!(body.size(), Some(12));
/// assert_eq!(body.read(5).unwrap(), b"Hello");
/// assert_eq!(body.read(100).unwrap(), b", world");
/// assert_eq!(body.read(100).unwrap(), b"");
///
/// // Materializing always yields the whole buffer
/// assert_eq!(body.contents().unwrap(), b"Hello, world");
/// ```
pub struct Body {
    kind: Kind,
}

enum Kind {
    Buffer { data: Vec<u8>, offset: usize },
    Stream(Box<dyn Resource>),
}

impl Body {
    /// An in-memory body.
    #[inline]
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: Kind::Buffer {
                data: data.into(),
                offset: 0,
            },
        }
    }

    /// A streamed body.
    #[inline]
    pub fn from_resource<R: Resource + 'static>(resource: R) -> Self {
        Self::from_boxed(Box::new(resource))
    }

    #[inline]
    pub fn from_boxed(resource: Box<dyn Resource>) -> Self {
        Self {
            kind: Kind::Stream(resource),
        }
    }

    #[inline]
    pub fn is_stream(&self) -> bool {
        matches!(self.kind, Kind::Stream(_))
    }

    /// Known length in bytes; `None` means chunked transfer.
    #[inline]
    pub fn size(&self) -> Option<u64> {
        match &self.kind {
            Kind::Buffer { data, .. } => Some(data.len() as u64),
            Kind::Stream(resource) => resource.size(),
        }
    }

    /// Reads up to `len` bytes and advances the cursor.
    ///
    /// An empty result means the body is exhausted.
    pub fn read(&mut self, len: usize) -> io::Result<Vec<u8>> {
        match &mut self.kind {
            Kind::Buffer { data, offset } => {
                let start = (*offset).min(data.len());
                let end = start.saturating_add(len).min(data.len());
                *offset = end;
                Ok(data[start..end].to_vec())
            }
            Kind::Stream(resource) => {
                let mut chunk = Vec::with_capacity(len.min(64 * 1024));
                resource.take(len as u64).read_to_end(&mut chunk)?;
                Ok(chunk)
            }
        }
    }

    /// Full contents.
    ///
    /// A buffer returns everything regardless of the cursor. A stream returns
    /// what remains from its current position and is exhausted afterwards.
    pub fn contents(&mut self) -> io::Result<Vec<u8>> {
        match &mut self.kind {
            Kind::Buffer { data, .. } => Ok(data.clone()),
            Kind::Stream(resource) => {
                let mut data = Vec::new();
                resource.read_to_end(&mut data)?;
                Ok(data)
            }
        }
    }

    /// The bytes of an in-memory body, without touching the cursor.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            Kind::Buffer { data, .. } => Some(data),
            Kind::Stream(_) => None,
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Buffer { data, offset } => {
                let start = (*offset).min(data.len());
                let read = (&data[start..]).read(buf)?;
                *offset = start + read;
                Ok(read)
            }
            Kind::Stream(resource) => resource.read(buf),
        }
    }
}

impl Clone for Body {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Buffer { data, offset } => Kind::Buffer {
                data: data.clone(),
                offset: *offset,
            },
            Kind::Stream(resource) => Kind::Stream(resource.duplicate()),
        };

        Self { kind }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Buffer { data, offset } => f
                .debug_struct("Body::Buffer")
                .field("len", &data.len())
                .field("offset", offset)
                .finish(),
            Kind::Stream(resource) => f.debug_tuple("Body::Stream").field(resource).finish(),
        }
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::from_bytes(value)
    }
}
impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::from_bytes(value)
    }
}
impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Self::from_bytes(value)
    }
}
impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::from_bytes(value)
    }
}
impl From<Box<dyn Resource>> for Body {
    fn from(value: Box<dyn Resource>) -> Self {
        Self::from_boxed(value)
    }
}
