//! Decides whether a conditional request is satisfied by the client's cached copy.

use axum::http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use axum::http::HeaderMap;
use tracing::debug;

use crate::validators::{truncate_to_secs, Validators};

/// True if the client's copy is current.
///
/// Either an `If-None-Match` equal to the quoted tag or an
/// `If-Modified-Since` at or after the last modification is enough.
/// Unparseable dates and non-ASCII values count as absent.
pub fn is_not_modified(request: &HeaderMap, validators: &Validators) -> bool {
    etag_matches(request, validators) || unmodified_since(request, validators)
}

fn etag_matches(request: &HeaderMap, validators: &Validators) -> bool {
    let Some(value) = request.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    value.trim() == validators.quoted_etag()
}

fn unmodified_since(request: &HeaderMap, validators: &Validators) -> bool {
    let Some(value) = request.get(IF_MODIFIED_SINCE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    match httpdate::parse_http_date(value.trim()) {
        Ok(since) => truncate_to_secs(since) >= validators.last_modified(),
        Err(_) => {
            debug!(value, "ignoring unparseable If-Modified-Since");
            false
        }
    }
}
