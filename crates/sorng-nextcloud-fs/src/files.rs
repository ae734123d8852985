// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · files
// ──────────────────────────────────────────────────────────────────────────────
// The public files API over any DavTransport:
//  • Listing / search / lookup by id or path
//  • Upload / download (buffered and streaming, chunked upload protocol)
//  • mkdir / makedirs / delete / move / copy
//  • Favorites and criteria listings
//  • files_lock LOCK / UNLOCK
// Trash-bin, versions and system tags live in sibling modules.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::NcSession;
use crate::config::{CHUNK_V2_MIN_SIZE, DEFAULT_CHUNK_SIZE, DEFAULT_UPLOAD_ROOT};
use crate::error::{check_status, NcError, NcResult};
use crate::multistatus;
use crate::node::{FsNode, PathRef};
use crate::search::{self, prop_list, PROPFIND_PROPERTIES};
use crate::transport::{encode_path, DavRequest, DavResponse, DavTransport, DavVerb};
use crate::types::{LockType, PropFindType, SearchToken, TagRef};
use crate::xml::XmlElement;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use log::{debug, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const STAGING_NAME_LEN: usize = 64;

// ── Request builders ─────────────────────────────────────────────────────────

/// `{root}/{user}/{path}` with empty parts omitted and `path` left-trimmed of `/`.
pub fn dav_get_obj_path(user: &str, path: &str, root: &str) -> String {
    let mut out = root.to_string();
    if !user.is_empty() {
        out.push('/');
        out.push_str(user);
    }
    if !path.is_empty() {
        out.push('/');
        out.push_str(path.trim_start_matches('/'));
    }
    out
}

/// `PROPFIND` body requesting `properties`.
pub fn build_propfind_body(properties: &[&str]) -> XmlElement {
    XmlElement::new("d:propfind")
        .with_dav_namespaces()
        .with_child(prop_list(properties))
}

/// `REPORT` body listing the user's favorites.
pub fn build_listfav_body() -> XmlElement {
    XmlElement::new("oc:filter-files").with_dav_namespaces().with_child(
        XmlElement::new("oc:filter-rules").with_child(XmlElement::new("oc:favorite").with_text("1")),
    )
}

/// `REPORT` body filtering by favorite flag and/or system tags.
pub fn build_list_by_criteria_body(properties: &[&str], tags: &[TagRef]) -> NcResult<XmlElement> {
    if properties.is_empty() && tags.is_empty() {
        return Err(NcError::invalid(
            "Either specify 'properties' or 'tags' to filter results.",
        ));
    }
    let mut rules = XmlElement::new("oc:filter-rules");
    if properties.contains(&"favorite") {
        rules.push(XmlElement::new("oc:favorite").with_text("1"));
    }
    for tag in tags {
        rules.push(XmlElement::new("oc:systemtag").with_text(tag.id().to_string()));
    }
    Ok(XmlElement::new("oc:filter-files")
        .with_dav_namespaces()
        .with_child(prop_list(PROPFIND_PROPERTIES))
        .with_child(rules))
}

/// `PROPPATCH` body toggling `oc:favorite`.
pub fn build_setfav_body(value: bool) -> XmlElement {
    XmlElement::new("d:propertyupdate")
        .with_attr("xmlns:d", crate::xml::NS_DAV)
        .with_attr("xmlns:oc", crate::xml::NS_OWNCLOUD)
        .with_child(
            XmlElement::new("d:set").with_child(
                XmlElement::new("d:prop")
                    .with_child(XmlElement::new("oc:favorite").with_text(if value { "1" } else { "0" })),
            ),
        )
}

fn depth_header(depth: i32) -> String {
    if depth == -1 {
        "infinity".to_string()
    } else {
        depth.to_string()
    }
}

/// A node built from the `OC-FileId` / `OC-Etag` headers of a creation reply.
fn node_from_headers(full_path: &str, resp: &DavResponse) -> FsNode {
    FsNode::with_identity(
        full_path,
        resp.header("OC-FileId").unwrap_or(""),
        resp.header("OC-Etag").unwrap_or(""),
    )
}

fn staging_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STAGING_NAME_LEN)
        .map(char::from)
        .collect()
}

/// Addresses shared by every step of one chunked upload.
#[derive(Clone, Copy)]
struct ChunkedUpload<'a> {
    user: &'a str,
    path: &'a str,
    full_path: &'a str,
    destination: &'a str,
    staging: &'a str,
    v2: bool,
}

// ── API ──────────────────────────────────────────────────────────────────────

/// File-system operations for the session's current user.
///
/// No state is cached between calls; the user and DAV endpoint are read from
/// the session on every operation.
#[derive(Debug)]
pub struct FilesApi<T: DavTransport> {
    pub(crate) session: Arc<T>,
    chunk_size: usize,
    upload_root: String,
    upload_chunk_v2: bool,
}

impl<T: DavTransport> Clone for FilesApi<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            chunk_size: self.chunk_size,
            upload_root: self.upload_root.clone(),
            upload_chunk_v2: self.upload_chunk_v2,
        }
    }
}

impl FilesApi<NcSession> {
    /// Use the chunking options configured on the session.
    pub fn for_session(session: NcSession) -> Self {
        let chunk_size = session.options().chunk_size;
        let upload_root = session.options().upload_root.clone();
        let upload_chunk_v2 = session.options().upload_chunk_v2;
        Self::new(session)
            .with_chunk_size(chunk_size)
            .with_upload_root(&upload_root)
            .with_upload_chunk_v2(upload_chunk_v2)
    }
}

impl<T: DavTransport> FilesApi<T> {
    pub fn new(session: T) -> Self {
        Self::from_arc(Arc::new(session))
    }

    pub fn from_arc(session: Arc<T>) -> Self {
        Self {
            session,
            chunk_size: DEFAULT_CHUNK_SIZE,
            upload_root: DEFAULT_UPLOAD_ROOT.to_string(),
            upload_chunk_v2: false,
        }
    }

    /// Piece size used when a transfer is called with `chunk_size: None`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_upload_root(mut self, upload_root: &str) -> Self {
        self.upload_root = upload_root.trim_end_matches('/').to_string();
        self
    }

    pub fn with_upload_chunk_v2(mut self, enabled: bool) -> Self {
        self.upload_chunk_v2 = enabled;
        self
    }

    pub fn session(&self) -> &T {
        &self.session
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn resolve_chunk_size(&self, chunk_size: Option<usize>) -> NcResult<usize> {
        match chunk_size.unwrap_or(self.chunk_size) {
            0 => Err(NcError::invalid("chunk_size must be positive")),
            n => Ok(n),
        }
    }

    // ── Listing ──────────────────────────────────────────────────────────

    /// Entries under `path`; `depth == -1` means unlimited.
    pub async fn listdir(&self, path: impl Into<PathRef>, depth: i32, exclude_self: bool) -> NcResult<Vec<FsNode>> {
        if exclude_self && depth == 0 {
            return Err(NcError::invalid("Wrong input parameters, query will return nothing."));
        }
        let path = path.into().user_path();
        self.propfind_nodes(&path, PROPFIND_PROPERTIES, depth, exclude_self, PropFindType::Default)
            .await
    }

    /// Shared PROPFIND pipeline for file, trash-bin and version listings.
    pub(crate) async fn propfind_nodes(
        &self,
        path: &str,
        properties: &[&str],
        depth: i32,
        exclude_self: bool,
        mode: PropFindType,
    ) -> NcResult<Vec<FsNode>> {
        let user = self.session.user();
        let dav_path = match mode {
            PropFindType::VersionsFileId | PropFindType::VersionsCompositeId => {
                dav_get_obj_path(&format!("versions/{}/versions", user), path, "")
            }
            PropFindType::Trashbin => dav_get_obj_path(&format!("trashbin/{}/trash", user), path, ""),
            _ => dav_get_obj_path(&user, path, "/files"),
        };
        let request = DavRequest::verb(DavVerb::Propfind, dav_path)
            .header("Depth", depth_header(depth))
            .xml(build_propfind_body(properties).to_document());
        let resp = self.session.dav(request).await?;
        let info = format!("list: {}, {}, {:?}", user, path, properties);
        let mut nodes = multistatus::parse(
            resp.status,
            &resp.text(),
            &info,
            &self.session.dav_url_suffix(),
            mode,
        )?;
        if exclude_self {
            multistatus::exclude_self(&mut nodes, path);
        }
        Ok(nodes)
    }

    /// Search below `path` with a prefix-notation expression.
    pub async fn find(&self, expr: &[SearchToken], path: impl Into<PathRef>) -> NcResult<Vec<FsNode>> {
        let path = path.into().user_path();
        let user = self.session.user();
        let body = search::build_find_request(expr, &path, &user)?;
        let resp = self
            .session
            .dav(DavRequest::verb(DavVerb::Search, "").xml(body.to_document()))
            .await?;
        let info = format!("find: {}, [{}], {}", user, search::describe(expr), path);
        multistatus::parse(
            resp.status,
            &resp.text(),
            &info,
            &self.session.dav_url_suffix(),
            PropFindType::Default,
        )
    }

    /// Look up by composite or clear numeric file id.
    pub async fn by_id(&self, file_id: impl ToString) -> NcResult<Option<FsNode>> {
        let expr = [SearchToken::eq(crate::types::SearchProp::FileId, file_id.to_string())];
        Ok(self.find(&expr, "").await?.into_iter().next())
    }

    pub async fn by_path(&self, path: impl Into<PathRef>) -> NcResult<Option<FsNode>> {
        Ok(self.listdir(path, 0, false).await?.into_iter().next())
    }

    // ── Download ─────────────────────────────────────────────────────────

    pub async fn download(&self, path: impl Into<PathRef>) -> NcResult<Bytes> {
        let path = path.into().user_path();
        let user = self.session.user();
        let resp = self
            .session
            .dav(DavRequest::new(reqwest::Method::GET, dav_get_obj_path(&user, &path, "/files")))
            .await?;
        check_status(resp.status, &format!("download: user={}, path={}", user, path))?;
        Ok(resp.body)
    }

    /// Stream a file into `sink`, writing it in `chunk_size` pieces
    /// (the configured size when `None`).
    pub async fn download2stream<W>(
        &self,
        path: impl Into<PathRef>,
        sink: &mut W,
        chunk_size: Option<usize>,
    ) -> NcResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let chunk_size = self.resolve_chunk_size(chunk_size)?;
        let path = path.into().user_path();
        let user = self.session.user();
        let mut resp = self
            .session
            .dav_stream(DavRequest::new(reqwest::Method::GET, dav_get_obj_path(&user, &path, "/files")))
            .await?;
        check_status(resp.status, &format!("download2stream: user={}, path={}", user, path))?;
        let mut pending = BytesMut::new();
        while let Some(piece) = resp.body.next().await {
            pending.extend_from_slice(&piece?);
            while pending.len() >= chunk_size {
                sink.write_all(&pending.split_to(chunk_size)).await?;
            }
        }
        if !pending.is_empty() {
            sink.write_all(&pending).await?;
        }
        sink.flush().await?;
        Ok(())
    }

    /// Stream a file into a local file, created before the request is sent.
    pub async fn download2file(
        &self,
        path: impl Into<PathRef>,
        local_path: impl AsRef<Path>,
        chunk_size: Option<usize>,
    ) -> NcResult<()> {
        let chunk_size = self.resolve_chunk_size(chunk_size)?;
        let mut file = tokio::fs::File::create(local_path.as_ref()).await?;
        self.download2stream(path, &mut file, Some(chunk_size)).await
    }

    // ── Upload ───────────────────────────────────────────────────────────

    /// Single PUT of the whole payload. Strings are sent as UTF-8.
    pub async fn upload(&self, path: impl Into<PathRef>, content: impl Into<Bytes>) -> NcResult<FsNode> {
        let path = path.into().user_path();
        let user = self.session.user();
        let content = content.into();
        let full_path = dav_get_obj_path(&user, &path, "/files");
        let size = content.len();
        let resp = self
            .session
            .dav(DavRequest::new(reqwest::Method::PUT, full_path.clone()).body(content))
            .await?;
        check_status(
            resp.status,
            &format!("upload: user={}, path={}, size={}", user, path, size),
        )?;
        Ok(node_from_headers(full_path.trim_matches('/'), &resp))
    }

    /// Chunked upload from `source`; the staging collection is always removed.
    ///
    /// A failed cleanup `DELETE` that could not reach the server is reported
    /// when the upload itself succeeded; a cleanup status failure is only logged.
    pub async fn upload_stream<R>(
        &self,
        path: impl Into<PathRef>,
        source: &mut R,
        chunk_size: Option<usize>,
    ) -> NcResult<FsNode>
    where
        R: AsyncRead + Unpin + Send,
    {
        let chunk_size = self.resolve_chunk_size(chunk_size)?;
        let v2 = self.upload_chunk_v2 && chunk_size >= CHUNK_V2_MIN_SIZE;
        let path = path.into().user_path();
        let user = self.session.user();
        let full_path = dav_get_obj_path(&user, &path, "/files");
        let destination = format!("{}{}", self.session.dav_endpoint(), encode_path(&full_path));
        let staging = dav_get_obj_path(&user, &staging_name(), &self.upload_root);

        let mut mkcol = DavRequest::verb(DavVerb::Mkcol, staging.clone());
        if v2 {
            mkcol = mkcol.header("Destination", destination.clone());
        }
        let resp = self.session.dav(mkcol).await?;
        check_status(
            resp.status,
            &format!("upload_stream(v={}): user={}, path={}, mkcol", v2, user, path),
        )?;

        let upload = ChunkedUpload {
            user: &user,
            path: &path,
            full_path: &full_path,
            destination: &destination,
            staging: &staging,
            v2,
        };
        let result = self.upload_chunks(&upload, source, chunk_size).await;

        let cleanup = self
            .session
            .dav(DavRequest::new(reqwest::Method::DELETE, staging.clone()))
            .await;
        match (cleanup, result) {
            (Ok(resp), result) => {
                if resp.status >= 400 {
                    warn!("upload_stream: cleanup of {} answered {}", staging, resp.status);
                }
                result
            }
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(main)) => {
                warn!("upload_stream: cleanup of {} failed: {}", staging, e);
                Err(main)
            }
        }
    }

    async fn upload_chunks<R>(&self, upload: &ChunkedUpload<'_>, source: &mut R, chunk_size: usize) -> NcResult<FsNode>
    where
        R: AsyncRead + Unpin + Send,
    {
        let ChunkedUpload {
            user,
            path,
            full_path,
            destination,
            staging,
            v2,
        } = *upload;
        let mut start = 0usize;
        let mut chunk_number = 0usize;
        loop {
            let mut piece = Vec::with_capacity(chunk_size);
            (&mut *source).take(chunk_size as u64).read_to_end(&mut piece).await?;
            if piece.is_empty() {
                break;
            }
            let end = start + piece.len();
            let request = if v2 {
                DavRequest::new(reqwest::Method::PUT, format!("{}/{}", staging, chunk_number))
                    .header("Destination", destination)
            } else {
                DavRequest::new(reqwest::Method::PUT, format!("{}/{:015}-{:015}", staging, start, end))
            };
            let resp = self.session.dav(request.body(piece)).await?;
            check_status(
                resp.status,
                &format!("upload_stream(v={}): user={}, path={}, cur_size={}", v2, user, path, end),
            )?;
            start = end;
            chunk_number += 1;
        }

        let resp = self
            .session
            .dav(
                DavRequest::verb(DavVerb::Move, format!("{}/.file", staging))
                    .header("Destination", destination)
                    .header("Overwrite", "T"),
            )
            .await?;
        check_status(
            resp.status,
            &format!("upload_stream(v={}): user={}, path={}, total_size={}", v2, user, path, start),
        )?;
        debug!("upload_stream: assembled {} bytes in {} pieces into {}", start, chunk_number, full_path);
        Ok(node_from_headers(full_path.trim_matches('/'), &resp))
    }

    /// Chunked upload of a local file.
    pub async fn upload_file(
        &self,
        path: impl Into<PathRef>,
        local_path: impl AsRef<Path>,
        chunk_size: Option<usize>,
    ) -> NcResult<FsNode> {
        let mut file = tokio::fs::File::open(local_path.as_ref()).await?;
        self.upload_stream(path, &mut file, chunk_size).await
    }

    // ── Directories / delete ─────────────────────────────────────────────

    /// Create one directory; the returned path always ends with `/`.
    pub async fn mkdir(&self, path: impl Into<PathRef>) -> NcResult<FsNode> {
        let path = path.into().user_path();
        let user = self.session.user();
        let full_path = dav_get_obj_path(&user, &path, "/files");
        let resp = self.session.dav(DavRequest::verb(DavVerb::Mkcol, full_path.clone())).await?;
        check_status(resp.status, &format!("mkdir: user={}, path={}", user, path))?;
        let dir_path = format!("{}/", full_path.trim_end_matches('/'));
        Ok(node_from_headers(dir_path.trim_start_matches('/'), &resp))
    }

    /// Create every missing component of `path`.
    ///
    /// With `exist_ok`, components answering 405 are skipped; `None` is
    /// returned when nothing was created.
    pub async fn makedirs(&self, path: impl Into<PathRef>, exist_ok: bool) -> NcResult<Option<FsNode>> {
        let path = path.into().user_path();
        let mut prefix = String::new();
        let mut result = None;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            match self.mkdir(prefix.as_str()).await {
                Ok(node) => result = Some(node),
                Err(e) if exist_ok && e.status_code() == Some(405) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// Delete (to trash when enabled); 404 is ignored with `not_fail`.
    pub async fn delete(&self, path: impl Into<PathRef>, not_fail: bool) -> NcResult<()> {
        let path = path.into().user_path();
        let user = self.session.user();
        let resp = self
            .session
            .dav(DavRequest::new(reqwest::Method::DELETE, dav_get_obj_path(&user, &path, "/files")))
            .await?;
        if resp.status == 404 && not_fail {
            return Ok(());
        }
        check_status(resp.status, &format!("delete: user={}, path={}", user, path))
    }

    // ── Move / copy ──────────────────────────────────────────────────────

    pub async fn move_to(&self, src: impl Into<PathRef>, dest: impl Into<PathRef>, overwrite: bool) -> NcResult<FsNode> {
        self.transfer(DavVerb::Move, src.into(), dest.into(), overwrite).await
    }

    pub async fn copy_to(&self, src: impl Into<PathRef>, dest: impl Into<PathRef>, overwrite: bool) -> NcResult<FsNode> {
        self.transfer(DavVerb::Copy, src.into(), dest.into(), overwrite).await
    }

    async fn transfer(&self, verb: DavVerb, src: PathRef, dest: PathRef, overwrite: bool) -> NcResult<FsNode> {
        let src = src.user_path();
        let user = self.session.user();
        let full_dest = dav_get_obj_path(&user, &dest.user_path(), "/files");
        let destination = format!("{}{}", self.session.dav_endpoint(), encode_path(&full_dest));
        let resp = self
            .session
            .dav(
                DavRequest::verb(verb, dav_get_obj_path(&user, &src, "/files"))
                    .header("Destination", destination.clone())
                    .header("Overwrite", if overwrite { "T" } else { "F" }),
            )
            .await?;
        let info = format!(
            "{}: user={}, src={}, dest={}, {}",
            verb.as_str().to_lowercase(),
            user,
            src,
            destination,
            overwrite
        );
        check_status(resp.status, &info)?;
        let file_id = resp
            .header("OC-FileId")
            .ok_or_else(|| NcError::malformed(resp.status, "missing OC-FileId header", info.clone()))?
            .to_string();
        self.by_id(&file_id)
            .await?
            .ok_or_else(|| NcError::not_found(format!("{} (fileid={})", info, file_id)))
    }

    // ── Favorites & criteria ─────────────────────────────────────────────

    /// Favorites of the current user; bare entries are resolved by path.
    pub async fn listfav(&self) -> NcResult<Vec<FsNode>> {
        let user = self.session.user();
        let resp = self
            .session
            .dav(
                DavRequest::verb(DavVerb::Report, dav_get_obj_path(&user, "", "/files"))
                    .xml(build_listfav_body().to_document()),
            )
            .await?;
        let info = format!("listfav: {}", user);
        let records = multistatus::response_records(resp.status, &resp.text(), &info)?;
        let parsed = multistatus::parse_all(&records, &self.session.dav_url_suffix(), PropFindType::Favorite);
        let mut result = Vec::with_capacity(parsed.len());
        for node in parsed {
            if !node.file_id.is_empty() {
                result.push(node);
                continue;
            }
            match self.by_path(node.user_path()).await {
                Ok(Some(mut resolved)) => {
                    resolved.info.favorite = true;
                    result.push(resolved);
                }
                Ok(None) => debug!("listfav: dropping unresolved entry {}", node.full_path),
                Err(e) if e.is_not_found() => debug!("listfav: dropping vanished entry {}", node.full_path),
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// Files matching the favorite flag (`properties = ["favorite"]`) and/or tags.
    pub async fn list_by_criteria(&self, properties: &[&str], tags: &[TagRef]) -> NcResult<Vec<FsNode>> {
        let body = build_list_by_criteria_body(properties, tags)?;
        let user = self.session.user();
        let resp = self
            .session
            .dav(DavRequest::verb(DavVerb::Report, dav_get_obj_path(&user, "", "/files")).xml(body.to_document()))
            .await?;
        multistatus::parse(
            resp.status,
            &resp.text(),
            &format!("list_files_by_criteria: {}", user),
            &self.session.dav_url_suffix(),
            PropFindType::Default,
        )
    }

    /// Set or clear the favorite flag. The passed node is not modified.
    pub async fn setfav(&self, path: impl Into<PathRef>, value: bool) -> NcResult<()> {
        let path = path.into().user_path();
        let user = self.session.user();
        let resp = self
            .session
            .dav(
                DavRequest::verb(DavVerb::Proppatch, dav_get_obj_path(&user, &path, "/files"))
                    .xml(build_setfav_body(value).to_document()),
            )
            .await?;
        check_status(resp.status, &format!("setfav: path={}, value={}", path, value))
    }

    // ── Locks ────────────────────────────────────────────────────────────

    /// 423 means a lock is already held.
    pub async fn lock(&self, path: impl Into<PathRef>, lock_type: LockType) -> NcResult<()> {
        let user = self.session.user();
        let full_path = dav_get_obj_path(&user, &path.into().user_path(), "/files");
        let resp = self
            .session
            .dav(
                DavRequest::verb(DavVerb::Lock, full_path.clone())
                    .header("X-User-Lock", "1")
                    .header("X-User-Lock-Type", lock_type.as_i64().to_string()),
            )
            .await?;
        check_status(resp.status, &format!("lock: user={}, path={}", user, full_path))
    }

    /// 412 means not locked, 423 means locked by someone else.
    pub async fn unlock(&self, path: impl Into<PathRef>) -> NcResult<()> {
        let user = self.session.user();
        let full_path = dav_get_obj_path(&user, &path.into().user_path(), "/files");
        let resp = self
            .session
            .dav(DavRequest::verb(DavVerb::Unlock, full_path.clone()).header("X-User-Lock", "1"))
            .await?;
        check_status(resp.status, &format!("unlock: user={}, path={}", user, full_path))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_path_composition() {
        assert_eq!(dav_get_obj_path("admin", "", "/files"), "/files/admin");
        assert_eq!(dav_get_obj_path("admin", "/a/b", "/files"), "/files/admin/a/b");
        assert_eq!(dav_get_obj_path("admin", "x/", "/files"), "/files/admin/x/");
        assert_eq!(dav_get_obj_path("versions/u/versions", "12", ""), "/versions/u/versions/12");
        assert_eq!(dav_get_obj_path("", "", "/files"), "/files");
    }

    #[test]
    fn depth_values() {
        assert_eq!(depth_header(-1), "infinity");
        assert_eq!(depth_header(0), "0");
        assert_eq!(depth_header(2), "2");
    }

    #[test]
    fn for_session_takes_transfer_options() {
        let mut cfg = crate::config::NcConfig::new("https://nc.test", "alice", "pw");
        cfg.options.chunk_size = 3;
        cfg.options.upload_root = "/up/".into();
        cfg.options.upload_chunk_v2 = true;
        let files = FilesApi::for_session(NcSession::new(cfg).unwrap());

        assert_eq!(files.chunk_size(), 3);
        assert_eq!(files.resolve_chunk_size(None).unwrap(), 3);
        assert_eq!(files.resolve_chunk_size(Some(8)).unwrap(), 8);
        assert_eq!(files.upload_root, "/up");
        assert!(files.upload_chunk_v2);
        assert!(matches!(files.resolve_chunk_size(Some(0)), Err(NcError::InvalidArgument(_))));
    }

    #[test]
    fn staging_names_are_alphanumeric() {
        let a = staging_name();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, staging_name());
    }

    #[test]
    fn listfav_body() {
        let doc = build_listfav_body().to_document();
        assert!(doc.contains("<oc:filter-files xmlns:d=\"DAV:\" xmlns:oc=\"http://owncloud.org/ns\""));
        assert!(doc.contains("<oc:filter-rules><oc:favorite>1</oc:favorite></oc:filter-rules>"));
        assert!(!doc.contains("d:prop"));
    }

    #[test]
    fn criteria_body_requires_a_filter() {
        assert!(matches!(
            build_list_by_criteria_body(&[], &[]),
            Err(NcError::InvalidArgument(_))
        ));
        let body = build_list_by_criteria_body(&["favorite"], &[TagRef::Id(3), TagRef::Id(9)]).unwrap();
        let rules = body.child("oc:filter-rules").unwrap();
        let names: Vec<_> = rules.children.iter().map(|c| (c.name.as_str(), c.text.as_str())).collect();
        assert_eq!(
            names,
            vec![("oc:favorite", "1"), ("oc:systemtag", "3"), ("oc:systemtag", "9")]
        );
        assert_eq!(body.child("d:prop").unwrap().children.len(), PROPFIND_PROPERTIES.len());
    }

    #[test]
    fn setfav_body() {
        let doc = build_setfav_body(false).to_document();
        assert!(doc.contains("<d:set><d:prop><oc:favorite>0</oc:favorite></d:prop></d:set>"));
        assert!(!doc.contains("xmlns:nc"));
    }

    #[test]
    fn propfind_body_lists_properties() {
        let body = build_propfind_body(&["d:getetag", "oc:fileid"]);
        assert_eq!(
            body.to_document(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<d:propfind xmlns:d=\"DAV:\" \
             xmlns:oc=\"http://owncloud.org/ns\" xmlns:nc=\"http://nextcloud.org/ns\">\
             <d:prop><d:getetag/><oc:fileid/></d:prop></d:propfind>"
        );
    }
}
