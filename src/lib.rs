//! # axum-file-responder
//!
//! File responses for [`axum`][1] that get conditional GET and byte ranges right.
//!
//! A [`FileResponder`] looks at a file's state ([`FileInfo`]) and the request
//! headers and decides between a full body, `304 Not Modified`,
//! `206 Partial Content`, `416 Range Not Satisfiable` and `404 Not Found`,
//! attaching `Last-Modified`, `ETag`, `Cache-Control`, `Accept-Ranges`,
//! `Content-Length`, `Content-Type` and `Content-Range` as each outcome needs.
//!
//! Deciding never reads file contents. The decided [`FileResponse`] is
//! turned into bytes by [`FileResponse::stream`], which slices the file
//! through any [`RangeBody`]; [`KnownSize`] adapts a [`tokio::fs::File`].
//!
//! ```no_run
//! use axum::Router;
//! use axum::http::HeaderMap;
//! use axum::response::Response;
//! use axum::routing::get;
//!
//! use axum_file_responder::FileResponder;
//!
//! async fn document(headers: HeaderMap) -> Response {
//!     FileResponder::default().serve("document.txt", &headers).await
//! }
//!
//! let _app = Router::<()>::new().route("/", get(document));
//! ```
//!
//! [1]: https://docs.rs/axum

mod cache;
mod config;
mod error;
mod file;
mod responder;
mod stream;

pub mod conditional;
pub mod range;
pub mod validators;

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncSeek};

pub use cache::{CacheValidation, NoValidation, Validating};
pub use config::{CachePolicy, ResponderConfig, CACHE_PREVENTION};
pub use error::RangeError;
pub use file::{FileInfo, KnownSize};
pub use range::{RangeOutcome, RangeSpec};
pub use responder::{BodyPlan, FileResponder, FileResponse, Outcome};
pub use stream::RangedStream;
pub use validators::{BasicHeaders, Validators};

/// [`AsyncSeek`] narrowed to only allow seeking from start.
pub trait AsyncSeekStart {
    /// Same semantics as [`AsyncSeek::start_seek`], always passing position as the `SeekFrom::Start` variant.
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()>;

    /// Same semantics as [`AsyncSeek::poll_complete`], returning `()` instead of the new stream position.
    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>>;
}

impl<T: AsyncSeek> AsyncSeekStart for T {
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()> {
        AsyncSeek::start_seek(self, io::SeekFrom::Start(position))
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncSeek::poll_complete(self, cx).map_ok(|_| ())
    }
}

/// An [`AsyncRead`] and [`AsyncSeekStart`] with a fixed known byte size.
pub trait RangeBody: AsyncRead + AsyncSeekStart {
    /// The total size of the underlying file.
    ///
    /// This should not change for the lifetime of the object once queried.
    /// Behaviour is not guaranteed if it does change.
    fn byte_size(&self) -> u64;
}
