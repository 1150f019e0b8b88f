//! Cache validators and basic metadata derived from a file's state.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::HeaderValue;
use mime_guess::Mime;
use sha2::{Digest, Sha256};

use crate::FileInfo;

/// Headers every file response carries, found or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicHeaders {
    pub content_length: u64,
    /// Guessed from the path extension; `None` omits `Content-Type` entirely.
    pub content_type: Option<Mime>,
}

/// Values a client can send back to revalidate its cached copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    last_modified: SystemTime,
    etag: String,
}

impl Validators {
    /// Modification time truncated to whole seconds.
    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// The opaque tag, without quotes.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// The tag as it appears in `ETag` and `If-None-Match`: `"<tag>"`.
    pub fn quoted_etag(&self) -> String {
        format!("\"{}\"", self.etag)
    }

    pub fn etag_header(&self) -> HeaderValue {
        HeaderValue::from_str(&self.quoted_etag()).expect("hex digest is a valid header value")
    }
}

/// Length and content type for `file`.
pub fn basic_headers(file: &FileInfo) -> BasicHeaders {
    BasicHeaders {
        content_length: file.len(),
        content_type: mime_guess::from_path(file.path()).first(),
    }
}

/// Derives the `Last-Modified` time and `ETag` for `file`.
pub fn derive(file: &FileInfo) -> Validators {
    let last_modified = truncate_to_secs(file.modified());
    Validators {
        last_modified,
        etag: generate_etag(file),
    }
}

/// First 8 bytes of the SHA-256 of `<mtime secs>:<path>`, as 16 hex digits.
///
/// Not a content hash: identical bytes at another path or time get another
/// tag, and rewriting a file within the same second keeps it.
pub fn generate_etag(file: &FileInfo) -> String {
    let mut hasher = Sha256::new();
    hasher.update(unix_secs(file.modified()).to_string().as_bytes());
    hasher.update(b":");
    hasher.update(file.path().to_string_lossy().as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// Formats `time` as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

pub(crate) fn truncate_to_secs(time: SystemTime) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(unix_secs(time))
}

// times before the epoch clamp to it
fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_at(path: &str, secs: u64) -> FileInfo {
        FileInfo::new(path, 100, UNIX_EPOCH + Duration::from_secs(secs))
    }

    #[test]
    fn test_basic_headers() {
        let headers = basic_headers(&file_at("static/index.html", 0));
        assert_eq!(100, headers.content_length);
        assert_eq!(Some(mime_guess::mime::TEXT_HTML), headers.content_type);
    }

    #[test]
    fn test_basic_headers_unknown_type() {
        let headers = basic_headers(&file_at("static/blob.zzunknown", 0));
        assert_eq!(None, headers.content_type);
    }

    #[test]
    fn test_etag_consistency() {
        let file = file_at("a.txt", 1_000_000);
        assert_eq!(derive(&file), derive(&file));
        assert_eq!(16, derive(&file).etag().len());
    }

    #[test]
    fn test_etag_fixed_value() {
        assert_eq!("dd548893a6ad4f8a", generate_etag(&file_at("a.txt", 1_000_000)));
    }

    #[test]
    fn test_etag_difference() {
        let a = generate_etag(&file_at("a.txt", 1_000_000));
        assert_ne!(a, generate_etag(&file_at("b.txt", 1_000_000)));
        assert_ne!(a, generate_etag(&file_at("a.txt", 1_000_001)));
    }

    #[test]
    fn test_quoted_etag() {
        let validators = derive(&file_at("a.txt", 1));
        let quoted = validators.quoted_etag();
        assert!(quoted.starts_with('"'));
        assert!(quoted.ends_with('"'));
        assert_eq!(quoted, validators.etag_header());
    }

    #[test]
    fn test_last_modified_second_precision() {
        let file = FileInfo::new("a.txt", 1, UNIX_EPOCH + Duration::from_millis(784_111_777_900));
        assert_eq!(UNIX_EPOCH + Duration::from_secs(784_111_777), derive(&file).last_modified());
    }

    #[test]
    fn test_format_http_date() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!("Sun, 06 Nov 1994 08:49:37 GMT", format_http_date(time));
    }
}
