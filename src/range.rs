//! Single byte-range requests.
//!
//! Only the first range of a `Range` header is interpreted; multipart
//! responses are never produced.

use axum::http::header::RANGE;
use axum::http::{HeaderMap, StatusCode};
use axum_extra::headers::{ContentLength, ContentRange, HeaderMapExt};

use crate::RangeError;

const UNIT: &str = "bytes=";

/// A parsed `Range` request against a body of `total` bytes.
///
/// `end` is inclusive and always populated: an open range ends at the last
/// byte, and an end past the last byte is pulled back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    start: u64,
    end: u64,
    total: u64,
}

/// How a [`RangeSpec`] is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// 206 with bytes `start..=end` of `total`.
    Partial { start: u64, end: u64, total: u64 },
    /// 416; `Content-Range: bytes */total`.
    Unsatisfiable { total: u64 },
}

impl RangeSpec {
    pub fn new(start: u64, end: Option<u64>, total: u64) -> Self {
        let last = total.saturating_sub(1);
        let end = end.map_or(last, |end| end.min(last));
        RangeSpec { start, end, total }
    }

    /// Parses a `Range` header value of the form `bytes=<start>-<end>?`.
    ///
    /// The unit is matched case-insensitively and whitespace around the
    /// range is tolerated. Anything after the first comma is ignored.
    ///
    /// ```
    /// use axum_file_responder::RangeSpec;
    ///
    /// let spec = RangeSpec::parse("bytes=5-", 100).unwrap();
    /// assert_eq!((5, 99), (spec.start(), spec.end()));
    /// assert!(RangeSpec::parse("not a range", 100).is_err());
    /// ```
    pub fn parse(header: &str, total: u64) -> Result<RangeSpec, RangeError> {
        let (start, end) = parse_first_range(header)
            .ok_or_else(|| RangeError::Malformed(header.to_string()))?;
        Ok(RangeSpec::new(start, end, total))
    }

    /// Reads the `Range` header of `request`.
    pub fn from_request(request: &HeaderMap, total: u64) -> Result<RangeSpec, RangeError> {
        let value = request.get(RANGE).ok_or(RangeError::NoRangeHeader)?;
        let header = value
            .to_str()
            .map_err(|_| RangeError::Malformed(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
        RangeSpec::parse(header, total)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// A range is servable when it starts inside the body and is not reversed.
    pub fn is_satisfiable(&self) -> bool {
        self.total > 0 && self.start <= self.total && self.start <= self.end
    }

    pub fn resolve(&self) -> RangeOutcome {
        if self.is_satisfiable() {
            RangeOutcome::Partial { start: self.start, end: self.end, total: self.total }
        } else {
            RangeOutcome::Unsatisfiable { total: self.total }
        }
    }
}

/// True when the request carries a `Range` header, whatever its value.
pub fn is_range_request(request: &HeaderMap) -> bool {
    request.contains_key(RANGE)
}

impl RangeOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            RangeOutcome::Partial { .. } => StatusCode::PARTIAL_CONTENT,
            RangeOutcome::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }

    pub fn content_range(&self) -> ContentRange {
        match *self {
            RangeOutcome::Partial { start, end, total } => ContentRange::bytes(start..=end, total)
                .expect("ContentRange::bytes cannot fail for an inclusive range"),
            RangeOutcome::Unsatisfiable { total } => ContentRange::unsatisfied_bytes(total),
        }
    }

    /// Byte offset and length the body must be sliced to, for partial content.
    pub fn window(&self) -> Option<(u64, u64)> {
        match *self {
            RangeOutcome::Partial { start, end, .. } => Some((start, end - start + 1)),
            RangeOutcome::Unsatisfiable { .. } => None,
        }
    }

    /// Overwrites `Content-Range`, and for partial content `Content-Length`.
    pub fn apply(&self, mut headers: HeaderMap) -> HeaderMap {
        headers.typed_insert(self.content_range());
        if let Some((_, len)) = self.window() {
            headers.typed_insert(ContentLength(len));
        }
        headers
    }
}

fn parse_first_range(header: &str) -> Option<(u64, Option<u64>)> {
    let header = header.trim();
    let unit = header.get(..UNIT.len())?;
    if !unit.eq_ignore_ascii_case(UNIT) {
        return None;
    }

    let first = header[UNIT.len()..].split(',').next()?.trim();
    let (start, end) = first.split_once('-')?;
    let start = parse_digits(start)?;
    let end = match end {
        "" => None,
        end => Some(parse_digits(end)?),
    };
    Some((start, end))
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
