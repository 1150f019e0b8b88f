use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::SystemTime;

use pin_project::pin_project;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt, ReadBuf};

use crate::{AsyncSeekStart, RangeBody};

/// Identity and state of the file a response is built for.
///
/// Created per request and never mutated; the decision engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    path: PathBuf,
    is_file: bool,
    len: u64,
    modified: SystemTime,
}

impl FileInfo {
    /// Describes a regular file without touching the file system.
    pub fn new(path: impl Into<PathBuf>, len: u64, modified: SystemTime) -> Self {
        FileInfo { path: path.into(), is_file: true, len, modified }
    }

    /// Describes a path that does not name a regular file.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        FileInfo {
            path: path.into(),
            is_file: false,
            len: 0,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    /// Calls [`tokio::fs::metadata`] on `path`.
    ///
    /// A path that does not exist yields [`FileInfo::missing`] rather than an
    /// error, as do directories and other non-regular entries.
    pub async fn stat(path: impl Into<PathBuf>) -> io::Result<FileInfo> {
        let path = path.into();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FileInfo::missing(path)),
            Err(e) => return Err(e),
        };

        if !metadata.is_file() {
            return Ok(FileInfo::missing(path));
        }

        let modified = metadata.modified()?;
        Ok(FileInfo { path, is_file: true, len: metadata.len(), modified })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_file(&self) -> bool {
        self.is_file
    }

    /// Size in bytes. Zero for anything that is not a regular file.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }
}

/// Implements [`RangeBody`] for any [`AsyncRead`] and [`AsyncSeekStart`], constructed with a fixed byte size.
#[pin_project]
pub struct KnownSize<B: AsyncRead + AsyncSeekStart> {
    byte_size: u64,
    #[pin]
    body: B,
}

impl<B: AsyncRead + AsyncSeekStart> std::fmt::Debug for KnownSize<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownSize")
            .field("byte_size", &self.byte_size)
            .finish()
    }
}

impl KnownSize<File> {
    /// Calls [`tokio::fs::File::metadata`] to determine file size.
    pub async fn file(file: File) -> io::Result<KnownSize<File>> {
        let byte_size = file.metadata().await?.len();
        Ok(KnownSize { byte_size, body: file })
    }
}

impl<B: AsyncRead + AsyncSeekStart> KnownSize<B> {
    /// Construct a [`KnownSize`] instance with a byte size supplied manually.
    pub fn sized(body: B, byte_size: u64) -> Self {
        KnownSize { byte_size, body }
    }
}

impl<B: AsyncRead + AsyncSeek + Unpin> KnownSize<B> {
    /// Uses `seek` to determine size by seeking to the end and getting stream position.
    pub async fn seek(mut body: B) -> io::Result<KnownSize<B>> {
        let byte_size = Pin::new(&mut body).seek(io::SeekFrom::End(0)).await?;
        Ok(KnownSize { byte_size, body })
    }
}

impl<B: AsyncRead + AsyncSeekStart> AsyncRead for KnownSize<B> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.project().body.poll_read(cx, buf)
    }
}

impl<B: AsyncRead + AsyncSeekStart> AsyncSeekStart for KnownSize<B> {
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()> {
        self.project().body.start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().body.poll_complete(cx)
    }
}

impl<B: AsyncRead + AsyncSeekStart> RangeBody for KnownSize<B> {
    fn byte_size(&self) -> u64 {
        self.byte_size
    }
}
