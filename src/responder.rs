use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, ETAG};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{AcceptRanges, ContentLength, ContentType, HeaderMapExt, LastModified};
use tokio::fs::File;
use tracing::{debug, error, warn};

use crate::cache::{CacheValidation, NoValidation, Validating};
use crate::range::{self, RangeOutcome, RangeSpec};
use crate::validators::{self, Validators};
use crate::{FileInfo, KnownSize, RangeBody, RangeError, RangedStream, ResponderConfig};

/// What a [`FileResponse`] tells the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NotFound,
    NotModified,
    Full,
    Partial,
    RangeUnsatisfiable,
}

/// The bytes a response carries. Reading them is left to [`FileResponse::stream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPlan {
    Empty,
    /// `len` bytes of the file at `path`, starting at offset `start`.
    File { path: PathBuf, start: u64, len: u64 },
}

/// A decided response: status, headers and body plan, fixed once built.
#[derive(Debug, Clone)]
pub struct FileResponse {
    outcome: Outcome,
    status: StatusCode,
    headers: HeaderMap,
    body: BodyPlan,
}

impl FileResponse {
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &BodyPlan {
        &self.body
    }

    /// Opens the planned file slice, if any, and builds the axum response.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the file no longer
    /// holds the planned slice, since the headers already promise its length.
    pub async fn stream(self) -> io::Result<Response> {
        let body = match self.body {
            BodyPlan::Empty => Body::empty(),
            BodyPlan::File { path, start, len } => {
                let file = KnownSize::file(File::open(&path).await?).await?;
                if file.byte_size() < start.saturating_add(len) {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("{} shrank to {} bytes", path.display(), file.byte_size()),
                    ));
                }
                Body::new(RangedStream::new(file, start, len))
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        Ok(response)
    }
}

/// Builds file responses honouring conditional and range requests.
///
/// Cheap to clone and safe to share between tasks: responding never mutates
/// the responder.
#[derive(Debug, Clone)]
pub struct FileResponder {
    config: ResponderConfig,
    cache: Arc<dyn CacheValidation>,
}

impl Default for FileResponder {
    fn default() -> Self {
        FileResponder::new(ResponderConfig::default())
    }
}

impl FileResponder {
    pub fn new(config: ResponderConfig) -> Self {
        let cache = validation_for(&config);
        FileResponder { config, cache }
    }

    /// Replaces the cache validation strategy picked from the configuration.
    pub fn with_validation(mut self, cache: impl CacheValidation + 'static) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn with_serve_ranges(mut self, enabled: bool) -> Self {
        self.set_serve_ranges(enabled);
        self
    }

    pub fn with_cache_validation(mut self, enabled: bool) -> Self {
        self.set_cache_validation(enabled);
        self
    }

    pub fn set_serve_ranges(&mut self, enabled: bool) {
        self.config.serve_ranges = enabled;
    }

    pub fn set_cache_validation(&mut self, enabled: bool) {
        self.config.cache_validation = enabled;
        self.cache = validation_for(&self.config);
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Decides the response for `file` and the optional request headers.
    ///
    /// Runs, in order: existence check, metadata, conditional short-circuit,
    /// full body, range negotiation. A malformed `Range` header is returned
    /// as an error rather than silently served in full.
    pub fn respond(
        &self,
        file: Option<&FileInfo>,
        request: Option<&HeaderMap>,
    ) -> Result<FileResponse, RangeError> {
        let Some(file) = file.filter(|file| file.is_file()) else {
            debug!("no regular file, responding 404");
            return Ok(self.not_found(None));
        };

        let (headers, validators) = self.metadata(file);

        if let Some(request) = request {
            if self.cache.is_not_modified(request, validators.as_ref()) {
                debug!(path = %file.path().display(), "not modified");
                return Ok(not_modified(headers));
            }
        }

        let full = with_body(headers, file);

        match request {
            Some(request) if self.config.serve_ranges && range::is_range_request(request) => {
                negotiate_range(full, request, file.len())
            }
            _ => Ok(full),
        }
    }

    /// A 404, optionally carrying `body` as its content.
    pub fn not_found(&self, body: Option<&FileInfo>) -> FileResponse {
        let mut headers = HeaderMap::new();
        if let Some(prevention) = self.cache.prevention() {
            headers.insert(CACHE_CONTROL, prevention);
        }

        let body = match body.filter(|file| file.is_file()) {
            Some(file) => {
                headers = basic_headers(headers, file);
                full_file(file)
            }
            None => BodyPlan::Empty,
        };

        FileResponse {
            outcome: Outcome::NotFound,
            status: StatusCode::NOT_FOUND,
            headers,
            body,
        }
    }

    /// An empty response with the given status.
    pub fn create_response(&self, status: StatusCode) -> Response {
        status.into_response()
    }

    /// Stats `path`, decides, and streams the result.
    ///
    /// I/O failures become a logged 500 and a malformed `Range` header a 400.
    pub async fn serve(&self, path: impl Into<PathBuf>, request: &HeaderMap) -> Response {
        let path = path.into();
        let file = match FileInfo::stat(&path).await {
            Ok(file) => file,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to stat file");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let decided = match self.respond(Some(&file), Some(request)) {
            Ok(decided) => decided,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rejecting range request");
                return e.into_response();
            }
        };

        match decided.stream().await {
            Ok(response) => response,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to open file");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    fn metadata(&self, file: &FileInfo) -> (HeaderMap, Option<Validators>) {
        let mut headers = basic_headers(HeaderMap::new(), file);
        headers.typed_insert(LastModified::from(validators::truncate_to_secs(file.modified())));
        if self.config.serve_ranges {
            headers.typed_insert(AcceptRanges::bytes());
        }

        let validators = self.cache.validators(file);
        if let Some(cache_control) = self.cache.cache_control() {
            headers.insert(CACHE_CONTROL, cache_control);
        }
        if let Some(validators) = &validators {
            headers.insert(ETAG, validators.etag_header());
        }
        (headers, validators)
    }
}

fn validation_for(config: &ResponderConfig) -> Arc<dyn CacheValidation> {
    if config.cache_validation {
        Arc::new(Validating { policy: config.cache_policy })
    } else {
        Arc::new(NoValidation)
    }
}

fn basic_headers(mut headers: HeaderMap, file: &FileInfo) -> HeaderMap {
    let basic = validators::basic_headers(file);
    headers.typed_insert(ContentLength(basic.content_length));
    if let Some(mime) = basic.content_type {
        headers.typed_insert(ContentType::from(mime));
    }
    headers
}

fn full_file(file: &FileInfo) -> BodyPlan {
    BodyPlan::File { path: file.path().to_path_buf(), start: 0, len: file.len() }
}

fn not_modified(headers: HeaderMap) -> FileResponse {
    FileResponse {
        outcome: Outcome::NotModified,
        status: StatusCode::NOT_MODIFIED,
        headers,
        body: BodyPlan::Empty,
    }
}

fn with_body(headers: HeaderMap, file: &FileInfo) -> FileResponse {
    FileResponse {
        outcome: Outcome::Full,
        status: StatusCode::OK,
        headers,
        body: full_file(file),
    }
}

fn negotiate_range(
    full: FileResponse,
    request: &HeaderMap,
    total: u64,
) -> Result<FileResponse, RangeError> {
    let spec = RangeSpec::from_request(request, total)?;
    let outcome = spec.resolve();
    debug!(start = spec.start(), end = spec.end(), total, ?outcome, "range negotiated");

    let FileResponse { headers, body, .. } = full;
    let headers = outcome.apply(headers);
    let status = outcome.status();

    Ok(match (outcome, body) {
        (RangeOutcome::Partial { start, end, .. }, BodyPlan::File { path, .. }) => FileResponse {
            outcome: Outcome::Partial,
            status,
            headers,
            body: BodyPlan::File { path, start, len: end - start + 1 },
        },
        (RangeOutcome::Partial { .. }, body) => FileResponse {
            outcome: Outcome::Partial,
            status,
            headers,
            body,
        },
        // the full body stays, matching the unchanged Content-Length
        (RangeOutcome::Unsatisfiable { .. }, body) => FileResponse {
            outcome: Outcome::RangeUnsatisfiable,
            status,
            headers,
            body,
        },
    })
}
