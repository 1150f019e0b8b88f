//! Pluggable cache validation.
//!
//! A [`FileResponder`](crate::FileResponder) picks [`Validating`] or
//! [`NoValidation`] once, from its configuration, and never checks the switch
//! again while building responses.

use std::fmt;

use axum::http::{HeaderMap, HeaderValue};

use crate::config::{CachePolicy, CACHE_PREVENTION};
use crate::conditional;
use crate::validators::{self, Validators};
use crate::FileInfo;

pub trait CacheValidation: fmt::Debug + Send + Sync {
    /// Validators for a file that is about to be served, if any are issued.
    fn validators(&self, file: &FileInfo) -> Option<Validators>;

    /// `Cache-Control` for a successful response.
    fn cache_control(&self) -> Option<HeaderValue>;

    /// `Cache-Control` for a not-found response.
    fn prevention(&self) -> Option<HeaderValue>;

    /// Whether `request` already holds the current representation.
    fn is_not_modified(&self, request: &HeaderMap, validators: Option<&Validators>) -> bool {
        validators.is_some_and(|v| conditional::is_not_modified(request, v))
    }
}

/// Issues `ETag`/`Cache-Control` and honours conditional requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validating {
    pub policy: CachePolicy,
}

impl CacheValidation for Validating {
    fn validators(&self, file: &FileInfo) -> Option<Validators> {
        Some(validators::derive(file))
    }

    fn cache_control(&self) -> Option<HeaderValue> {
        Some(self.policy.to_header_value())
    }

    fn prevention(&self) -> Option<HeaderValue> {
        Some(HeaderValue::from_static(CACHE_PREVENTION))
    }
}

/// Cache validation switched off: nothing is issued, nothing is ever "not modified".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl CacheValidation for NoValidation {
    fn validators(&self, _file: &FileInfo) -> Option<Validators> {
        None
    }

    fn cache_control(&self) -> Option<HeaderValue> {
        None
    }

    fn prevention(&self) -> Option<HeaderValue> {
        None
    }
}
