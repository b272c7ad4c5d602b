//! Uploaded files and their storage.

use crate::errors::Error;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{debug, warn};

/// Outcome of a single file upload, using the conventional numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadStatus {
    /// 0, the file was received.
    #[default]
    Ok,
    /// 1, larger than the server-wide limit.
    IniSize,
    /// 2, larger than the limit declared by the form.
    FormSize,
    /// 3, only part of the file arrived.
    Partial,
    /// 4, the field was left empty.
    NoFile,
    /// 6
    NoTmpDir,
    /// 7
    CantWrite,
    /// 8, an extension stopped the upload.
    Extension,
    /// Any other code.
    Unknown(u8),
}

impl UploadStatus {
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::IniSize,
            2 => Self::FormSize,
            3 => Self::Partial,
            4 => Self::NoFile,
            6 => Self::NoTmpDir,
            7 => Self::CantWrite,
            8 => Self::Extension,
            n => Self::Unknown(n),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
            Self::Unknown(n) => n,
        }
    }
}

/// Persists an uploaded file from its temporary location.
///
/// Implementations only move bytes; the exactly-once guarantee is enforced by
/// [`UploadedFile::move_to`].
pub trait FileStore {
    fn persist(&self, tmp_path: &Path, target: &Path) -> io::Result<()>;
}

/// Stores files on the local filesystem.
///
/// Renames when possible and falls back to copy and remove, which covers
/// targets on another device.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FileStore for FsStore {
    fn persist(&self, tmp_path: &Path, target: &Path) -> io::Result<()> {
        if let Err(err) = fs::rename(tmp_path, target) {
            debug!(error = %err, "rename failed, copying the upload instead");

            fs::copy(tmp_path, target)?;
            fs::remove_file(tmp_path)?;
        }
        Ok(())
    }
}

/// A file received with a multipart request.
///
/// Clones share the moved state, so a file can be persisted only once no
/// matter which copy performs the move.
///
/// # Examples
/// ```
/// use http_value::{UploadStatus, UploadedFile};
///
/// let file = UploadedFile::new("/tmp/upload-1a2b", "logo.PNG", "image/png", 1024, UploadStatus::Ok);
///
/// assert_eq!(file.extension(), "PNG");
/// assert!(file.is_valid());
/// assert!(file.is_selected());
/// ```
#[derive(Debug, Clone)]
pub struct UploadedFile {
    path: PathBuf,
    name: String,
    mime_type: String,
    size: u64,
    status: UploadStatus,
    moved: Arc<AtomicBool>,
}

impl UploadedFile {
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        status: UploadStatus,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            status,
            moved: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Temporary location of the file on the server.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as sent by the client.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text after the last `.` of the client file name, or `""`.
    pub fn extension(&self) -> &str {
        let base = self.name.rsplit(['/', '\\']).next().unwrap_or_default();
        match base.rsplit_once('.') {
            Some((_, extension)) => extension,
            None => "",
        }
    }

    /// MIME type as sent by the client; do not trust it.
    #[inline]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.status == UploadStatus::Ok
    }

    /// Whether the user picked a file for this field at all.
    #[inline]
    pub fn is_selected(&self) -> bool {
        self.status != UploadStatus::NoFile
    }

    #[inline]
    pub fn is_moved(&self) -> bool {
        self.moved.load(Ordering::Acquire)
    }

    /// Persists the file to `target` through `store`.
    ///
    /// # Errors
    /// - [`Error::AlreadyMoved`] on any call after the first one that
    ///   succeeded, including calls on clones.
    /// - [`Error::Io`] when the store fails; the file may then be moved again.
    pub fn move_to(&self, store: &dyn FileStore, target: impl AsRef<Path>) -> Result<(), Error> {
        let target = target.as_ref();

        if self.moved.swap(true, Ordering::AcqRel) {
            warn!(file = %self.path.display(), "refusing to move an uploaded file twice");
            return Err(Error::AlreadyMoved);
        }

        if let Err(err) = store.persist(&self.path, target) {
            self.moved.store(false, Ordering::Release);
            return Err(err.into());
        }

        debug!(from = %self.path.display(), to = %target.display(), "uploaded file moved");
        Ok(())
    }
}

impl PartialEq for UploadedFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.name == other.name
            && self.mime_type == other.mime_type
            && self.size == other.size
            && self.status == other.status
    }
}

impl Eq for UploadedFile {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(PathBuf, PathBuf)>>);

    impl FileStore for Recorder {
        fn persist(&self, tmp_path: &Path, target: &Path) -> io::Result<()> {
            self.0
                .lock()
                .unwrap()
                .push((tmp_path.to_path_buf(), target.to_path_buf()));
            Ok(())
        }
    }

    struct Broken;

    impl FileStore for Broken {
        fn persist(&self, _: &Path, _: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn file(name: &str, status: UploadStatus) -> UploadedFile {
        UploadedFile::new("/tmp/upload", name, "text/plain", 5, status)
    }

    #[test]
    fn status_codes() {
        for code in [0, 1, 2, 3, 4, 6, 7, 8, 5, 42] {
            assert_eq!(UploadStatus::from_code(code).code(), code);
        }

        assert_eq!(UploadStatus::from_code(4), UploadStatus::NoFile);
        assert_eq!(UploadStatus::from_code(5), UploadStatus::Unknown(5));
    }

    #[test]
    fn predicates() {
        let cases = [
            (UploadStatus::Ok, true, true),
            (UploadStatus::IniSize, false, true),
            (UploadStatus::Partial, false, true),
            (UploadStatus::NoFile, false, false),
            (UploadStatus::Unknown(9), false, true),
        ];

        for (status, valid, selected) in cases {
            let file = file("a.txt", status);
            assert_eq!(file.is_valid(), valid, "{status:?}");
            assert_eq!(file.is_selected(), selected, "{status:?}");
        }
    }

    #[test]
    fn extension() {
        let cases = [
            ("photo.jpg", "jpg"),
            ("archive.tar.gz", "gz"),
            ("README", ""),
            ("trailing.", ""),
            (".hidden", "hidden"),
            ("dir.d/file", ""),
            ("C:\\docs\\report.PDF", "PDF"),
            ("", ""),
        ];

        for (name, expected) in cases {
            assert_eq!(file(name, UploadStatus::Ok).extension(), expected, "{name}");
        }
    }

    #[test]
    fn move_once() {
        let store = Recorder::default();
        let file = file("a.txt", UploadStatus::Ok);
        let copy = file.clone();

        file.move_to(&store, "/srv/a.txt").unwrap();
        assert!(copy.is_moved());
        assert!(matches!(copy.move_to(&store, "/srv/b.txt"), Err(Error::AlreadyMoved)));
        assert!(matches!(file.move_to(&store, "/srv/a.txt"), Err(Error::AlreadyMoved)));

        let calls = store.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (PathBuf::from("/tmp/upload"), PathBuf::from("/srv/a.txt")));
    }

    #[test]
    fn failed_move() {
        let file = file("a.txt", UploadStatus::Ok);

        assert!(matches!(file.move_to(&Broken, "/srv/a.txt"), Err(Error::Io(_))));
        assert!(!file.is_moved());

        file.move_to(&Recorder::default(), "/srv/a.txt").unwrap();
        assert!(file.is_moved());
    }

    #[test]
    fn fs_store() {
        let tmp = temp_path("upload-tmp");
        let target = temp_path("upload-target");
        fs::write(&tmp, b"hello").unwrap();

        let file = UploadedFile::new(&tmp, "hello.txt", "text/plain", 5, UploadStatus::Ok);
        file.move_to(&FsStore, &target).unwrap();

        assert!(!tmp.exists());
        assert_eq!(fs::read(&target).unwrap(), b"hello");
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn equality() {
        let a = file("a.txt", UploadStatus::Ok);
        let b = file("a.txt", UploadStatus::Ok);
        a.move_to(&Recorder::default(), "/x").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, file("b.txt", UploadStatus::Ok));
    }
}
