// Record/replay transport and WebDAV fixtures shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sorng_nextcloud_fs::{DavRequest, DavResponse, DavStreamResponse, DavTransport, FilesApi, NcError, NcResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const ENDPOINT: &str = "https://nc.test/remote.php/dav";
pub const SUFFIX: &str = "/remote.php/dav";

// ── Fake transport ───────────────────────────────────────────────────────────

pub enum Reply {
    Response {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
    Fail(String),
}

/// A request as seen by the transport.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Serves scripted replies in order and records every request.
pub struct FakeTransport {
    user: Mutex<String>,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Recorded>>,
    stream_piece: usize,
}

impl FakeTransport {
    pub fn new(user: &str) -> Arc<Self> {
        Self::with_stream_piece(user, 3)
    }

    /// `stream_piece` is the size of the pieces `dav_stream` yields.
    pub fn with_stream_piece(user: &str, stream_piece: usize) -> Arc<Self> {
        Arc::new(Self {
            user: Mutex::new(user.to_string()),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            stream_piece,
        })
    }

    pub fn set_user(&self, user: &str) {
        *self.user.lock().unwrap() = user.to_string();
    }

    pub fn reply(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.reply_with_headers(status, &[], body)
    }

    pub fn reply_with_headers(&self, status: u16, headers: &[(&str, &str)], body: impl Into<Vec<u8>>) -> &Self {
        self.replies.lock().unwrap().push_back(Reply::Response {
            status,
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: body.into(),
        });
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.replies.lock().unwrap().push_back(Reply::Fail(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn next(&self, request: DavRequest) -> NcResult<(u16, HeaderMap, Vec<u8>)> {
        self.requests.lock().unwrap().push(Recorded {
            method: request.method.to_string(),
            path: request.path.clone(),
            headers: request.headers.clone(),
            body: request.body.map(|b| b.to_vec()).unwrap_or_default(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(format!("no scripted reply for {}", request.path)));
        match reply {
            Reply::Fail(message) => Err(NcError::transport(message)),
            Reply::Response { status, headers, body } => {
                let mut map = HeaderMap::new();
                for (k, v) in headers {
                    map.insert(
                        HeaderName::from_bytes(k.as_bytes()).unwrap(),
                        HeaderValue::from_str(&v).unwrap(),
                    );
                }
                Ok((status, map, body))
            }
        }
    }
}

#[async_trait]
impl DavTransport for FakeTransport {
    fn user(&self) -> String {
        self.user.lock().unwrap().clone()
    }

    fn dav_endpoint(&self) -> String {
        ENDPOINT.to_string()
    }

    fn dav_url_suffix(&self) -> String {
        SUFFIX.to_string()
    }

    async fn dav(&self, request: DavRequest) -> NcResult<DavResponse> {
        let (status, headers, body) = self.next(request)?;
        Ok(DavResponse {
            status,
            headers,
            body: Bytes::from(body),
        })
    }

    async fn dav_stream(&self, request: DavRequest) -> NcResult<DavStreamResponse> {
        let (status, headers, body) = self.next(request)?;
        let pieces: Vec<NcResult<Bytes>> = body
            .chunks(self.stream_piece.max(1))
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(DavStreamResponse {
            status,
            headers,
            body: futures::stream::iter(pieces).boxed(),
        })
    }
}

pub fn api(fake: &Arc<FakeTransport>) -> FilesApi<FakeTransport> {
    FilesApi::from_arc(Arc::clone(fake))
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn multistatus(responses: &[String]) -> String {
    format!(
        r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns">{}</d:multistatus>"#,
        responses.concat()
    )
}

/// One `d:response` with a single "200 OK" propstat.
pub fn response(href: &str, props: &str) -> String {
    format!(
        "<d:response><d:href>{}</d:href><d:propstat><d:prop>{}</d:prop>\
         <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>",
        href, props
    )
}

pub fn file_props(fileid: i64, size: i64, favorite: bool) -> String {
    format!(
        "<d:getlastmodified>Sat, 29 Jul 2023 11:56:31 GMT</d:getlastmodified>\
         <d:getetag>\"etag{id}\"</d:getetag><d:getcontentlength>{size}</d:getcontentlength>\
         <d:getcontenttype>text/plain</d:getcontenttype><oc:size>{size}</oc:size>\
         <oc:id>{id:08}ocinst</oc:id><oc:fileid>{id}</oc:fileid>\
         <oc:permissions>RGDNVW</oc:permissions><oc:favorite>{fav}</oc:favorite>",
        id = fileid,
        size = size,
        fav = if favorite { 1 } else { 0 }
    )
}

pub fn dir_props(fileid: i64) -> String {
    format!(
        "<d:resourcetype><d:collection/></d:resourcetype>\
         <d:getetag>\"etag{id}\"</d:getetag><oc:size>0</oc:size>\
         <oc:id>{id:08}ocinst</oc:id><oc:fileid>{id}</oc:fileid>\
         <oc:permissions>RGDNVCK</oc:permissions><oc:favorite>0</oc:favorite>",
        id = fileid
    )
}

pub fn dav_error(exception: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<d:error xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns"><s:exception>{}</s:exception><s:message>{}</s:message></d:error>"#,
        exception, message
    )
}
