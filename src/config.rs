use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

/// `Cache-Control` value attached to 404 responses when cache validation is on.
pub const CACHE_PREVENTION: &str = "no-cache, no-store, must-revalidate";

/// Switches that shape every response built by a [`FileResponder`](crate::FileResponder).
///
/// Fields missing from a deserialized document take their default values,
/// so `{}` is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Honour `Range` requests and advertise `Accept-Ranges: bytes`.
    pub serve_ranges: bool,
    /// Attach `ETag`/`Cache-Control` and answer conditional requests with 304.
    pub cache_validation: bool,
    /// Directives sent on successful responses while cache validation is on.
    pub cache_policy: CachePolicy,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        ResponderConfig {
            serve_ranges: true,
            cache_validation: true,
            cache_policy: CachePolicy::default(),
        }
    }
}

/// Cache control policy for successful file responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Shared caches may store the file for `max_age` seconds.
    Public { max_age: u32 },
    /// Only the client's own cache may store the file.
    Private { max_age: u32 },
    NoCache,
    NoStore,
}

impl CachePolicy {
    /// Renders the policy as a `Cache-Control` header value.
    pub fn to_header_value(self) -> HeaderValue {
        match self {
            CachePolicy::Public { max_age } => format_value("public", max_age),
            CachePolicy::Private { max_age } => format_value("private", max_age),
            CachePolicy::NoCache => HeaderValue::from_static("no-cache"),
            CachePolicy::NoStore => HeaderValue::from_static("no-store"),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Private { max_age: 600 }
    }
}

fn format_value(scope: &'static str, max_age: u32) -> HeaderValue {
    HeaderValue::from_str(&format!("{scope}, max-age={max_age}"))
        .expect("cache directives are always visible ASCII")
}
