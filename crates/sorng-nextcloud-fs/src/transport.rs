// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · transport
// ──────────────────────────────────────────────────────────────────────────────
// The seam between the files API and the HTTP session:
//  • DavTransport trait (buffered + streaming primitives)
//  • request / response value types
//  • path percent-encoding shared by every WebDAV path and Destination header
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::NcResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::HeaderMap;
use reqwest::Method;

/// Characters kept verbatim when encoding a DAV path: `/` plus the RFC 3986
/// unreserved set.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode a DAV path, keeping `/` separators.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}

// ── Request ──────────────────────────────────────────────────────────────────

/// WebDAV extension verbs sent by the files API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavVerb {
    Propfind,
    Proppatch,
    Mkcol,
    Move,
    Copy,
    Search,
    Report,
    Lock,
    Unlock,
}

impl DavVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Propfind => "PROPFIND",
            Self::Proppatch => "PROPPATCH",
            Self::Mkcol => "MKCOL",
            Self::Move => "MOVE",
            Self::Copy => "COPY",
            Self::Search => "SEARCH",
            Self::Report => "REPORT",
            Self::Lock => "LOCK",
            Self::Unlock => "UNLOCK",
        }
    }

    pub fn method(self) -> Method {
        Method::from_bytes(self.as_str().as_bytes()).expect("WebDAV verbs are valid HTTP tokens")
    }
}

/// One WebDAV request; `path` is relative to the DAV suffix, unencoded.
#[derive(Debug, Clone)]
pub struct DavRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Bytes>,
    pub headers: Vec<(String, String)>,
}

impl DavRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Build a request for a WebDAV extension verb.
    pub fn verb(verb: DavVerb, path: impl Into<String>) -> Self {
        Self::new(verb.method(), path)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach an XML body with the matching content type.
    pub fn xml(self, body: String) -> Self {
        self.header("Content-Type", "text/xml").body(body)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ── Responses ────────────────────────────────────────────────────────────────

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct DavResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DavResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Response whose body is consumed incrementally.
pub struct DavStreamResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: BoxStream<'static, NcResult<Bytes>>,
}

impl std::fmt::Debug for DavStreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DavStreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

// ── Trait ────────────────────────────────────────────────────────────────────

/// Everything the files API needs from a session.
///
/// Connection-level failures are returned as `NcError::Transport`; HTTP
/// statuses are passed back untouched for the caller to classify.
#[async_trait]
pub trait DavTransport: Send + Sync {
    /// Acting user name.
    fn user(&self) -> String;

    /// Absolute DAV root, e.g. `https://host/remote.php/dav`.
    fn dav_endpoint(&self) -> String;

    /// Path prefix stripped from returned hrefs, e.g. `/remote.php/dav`.
    fn dav_url_suffix(&self) -> String;

    async fn dav(&self, request: DavRequest) -> NcResult<DavResponse>;

    async fn dav_stream(&self, request: DavRequest) -> NcResult<DavStreamResponse>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
