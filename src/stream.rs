use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use pin_project::pin_project;
use tokio::io::ReadBuf;

use crate::RangeBody;

const IO_BUFFER_SIZE: usize = 64 * 1024;

/// Streams `length` bytes of a [`RangeBody`] starting at `start`.
///
/// Implements [`Stream`], [`Body`], and [`IntoResponse`]. If the body runs
/// out before `length` bytes the stream yields an
/// [`io::ErrorKind::UnexpectedEof`] error, so a truncated transfer is never
/// mistaken for a complete one.
#[pin_project]
pub struct RangedStream<B> {
    state: StreamState,
    length: u64,
    #[pin]
    body: B,
}

#[derive(Debug)]
enum StreamState {
    Seek { start: u64 },
    Seeking,
    Reading { remaining: u64 },
    Done,
}

impl<B: RangeBody + Send + 'static> RangedStream<B> {
    pub fn new(body: B, start: u64, length: u64) -> Self {
        RangedStream {
            state: StreamState::Seek { start },
            length,
            body,
        }
    }

    /// Number of bytes this stream was asked to yield.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<B: RangeBody + Send + 'static> IntoResponse for RangedStream<B> {
    fn into_response(self) -> Response {
        Response::new(axum::body::Body::new(self))
    }
}

impl<B: RangeBody> Body for RangedStream<B> {
    type Data = Bytes;
    type Error = io::Error;

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.length)
    }

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>)
        -> Poll<Option<io::Result<Frame<Bytes>>>>
    {
        self.poll_next(cx).map(|item| item.map(|result| result.map(Frame::data)))
    }
}

impl<B: RangeBody> Stream for RangedStream<B> {
    type Item = io::Result<Bytes>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<io::Result<Bytes>>> {
        let mut this = self.project();

        loop {
            match *this.state {
                StreamState::Seek { start } => {
                    if *this.length == 0 {
                        *this.state = StreamState::Done;
                        continue;
                    }
                    if let Err(e) = this.body.as_mut().start_seek(start) {
                        *this.state = StreamState::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                    *this.state = StreamState::Seeking;
                }

                StreamState::Seeking => {
                    match this.body.as_mut().poll_complete(cx) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Err(e)) => {
                            *this.state = StreamState::Done;
                            return Poll::Ready(Some(Err(e)));
                        }
                        Poll::Ready(Ok(())) => {
                            *this.state = StreamState::Reading { remaining: *this.length };
                        }
                    }
                }

                StreamState::Reading { remaining } => {
                    if remaining == 0 {
                        *this.state = StreamState::Done;
                        continue;
                    }

                    // never read past the end of the requested window
                    let nbytes = usize::try_from(remaining)
                        .unwrap_or(usize::MAX)
                        .min(IO_BUFFER_SIZE);
                    let mut chunk = BytesMut::zeroed(nbytes);
                    let mut read_buf = ReadBuf::new(&mut chunk);

                    match this.body.as_mut().poll_read(cx, &mut read_buf) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Err(e)) => {
                            *this.state = StreamState::Done;
                            return Poll::Ready(Some(Err(e)));
                        }
                        Poll::Ready(Ok(())) => {
                            let filled = read_buf.filled().len();
                            if filled == 0 {
                                *this.state = StreamState::Done;
                                return Poll::Ready(Some(Err(io::Error::new(
                                    io::ErrorKind::UnexpectedEof,
                                    format!("body ended {remaining} bytes short"),
                                ))));
                            }
                            chunk.truncate(filled);
                            // filled <= nbytes <= remaining
                            *this.state = StreamState::Reading {
                                remaining: remaining - filled as u64,
                            };
                            return Poll::Ready(Some(Ok(chunk.freeze())));
                        }
                    }
                }

                StreamState::Done => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use bytes::Bytes;
    use futures::{pin_mut, Stream, StreamExt};
    use tokio::fs::File;

    use crate::KnownSize;

    use super::RangedStream;

    async fn collect_stream(stream: impl Stream<Item = io::Result<Bytes>>) -> String {
        let mut string = String::new();
        pin_mut!(stream);
        while let Some(chunk) = stream.next().await.transpose().unwrap() {
            string += std::str::from_utf8(&chunk).unwrap();
        }
        string
    }

    async fn body() -> KnownSize<File> {
        let file = File::open("test/fixture.txt").await.unwrap();
        KnownSize::file(file).await.unwrap()
    }

    #[tokio::test]
    async fn test_whole_file() {
        let stream = RangedStream::new(body().await, 0, 54);
        assert_eq!(
            "Hello world this is a file to test range requests on!\n",
            collect_stream(stream).await
        );
    }

    #[tokio::test]
    async fn test_slice() {
        let stream = RangedStream::new(body().await, 30, 24);
        assert_eq!("test range requests on!\n", collect_stream(stream).await);
    }

    #[tokio::test]
    async fn test_one_byte() {
        let stream = RangedStream::new(body().await, 30, 1);
        assert_eq!("t", collect_stream(stream).await);
    }

    #[tokio::test]
    async fn test_empty_window() {
        let stream = RangedStream::new(body().await, 0, 0);
        assert!(stream.is_empty());
        assert_eq!("", collect_stream(stream).await);
    }

    #[tokio::test]
    async fn test_window_past_eof_is_an_error() {
        let stream = RangedStream::new(body().await, 50, 100);
        pin_mut!(stream);
        assert_eq!(&b"on!\n"[..], &stream.next().await.unwrap().unwrap()[..]);
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(io::ErrorKind::UnexpectedEof, err.kind());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_large_body_chunks() {
        let data = vec![b'x'; 200 * 1024];
        let body = KnownSize::sized(Cursor::new(data), 200 * 1024);
        let stream = RangedStream::new(body, 1, 150 * 1024);
        let mut total = 0;
        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            assert!(chunk.len() <= 64 * 1024);
            total += chunk.len();
        }
        assert_eq!(150 * 1024, total);
    }
}
