use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure to interpret a `Range` request header.
///
/// Neither variant is produced for a missing or unservable file: those are
/// ordinary [`Outcome`](crate::Outcome)s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// The header value does not match `bytes=<start>-<end>?`. Carries the
    /// offending value.
    Malformed(String),
    /// Range resolution was asked for on a request without a `Range` header.
    NoRangeHeader,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Malformed(header) => write!(f, "bad Range header: {header}"),
            RangeError::NoRangeHeader => f.write_str("no Range header"),
        }
    }
}

impl std::error::Error for RangeError {}

impl IntoResponse for RangeError {
    fn into_response(self) -> Response {
        let status = match self {
            RangeError::Malformed(_) => StatusCode::BAD_REQUEST,
            RangeError::NoRangeHeader => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RangeError::Malformed("not a range".to_string());
        assert_eq!("bad Range header: not a range", err.to_string());
        assert_eq!("no Range header", RangeError::NoRangeHeader.to_string());
    }

    #[test]
    fn test_into_response_status() {
        let response = RangeError::Malformed("x".to_string()).into_response();
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        let response = RangeError::NoRangeHeader.into_response();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());
    }
}
