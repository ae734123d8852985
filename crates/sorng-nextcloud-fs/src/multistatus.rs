// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · multistatus
// ──────────────────────────────────────────────────────────────────────────────
// Turns a 207 Multi-Status reply into typed nodes:
//  • status / `d:error` validation
//  • per-record propstat merge (only "200 OK" blocks)
//  • property table mapping wire keys to node fields
//  • version-listing and exclude-self post-processing
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{check_status, NcError, NcResult};
use crate::node::FsNode;
use crate::types::{LockType, PropFindType};
use crate::xml::{self, XmlElement};
use log::debug;
use percent_encoding::percent_decode_str;

type Setter = fn(&mut FsNode, &str);

/// Recognised properties and how each one lands on the node.
const PROPERTY_TABLE: &[(&str, Setter)] = &[
    ("oc:id", |n, v| n.file_id = v.to_string()),
    ("oc:fileid", |n, v| n.info.fileid = to_int("oc:fileid", v)),
    ("oc:size", |n, v| n.info.size = to_int("oc:size", v)),
    ("d:getcontentlength", |n, v| n.info.content_length = to_int("d:getcontentlength", v)),
    ("d:getetag", |n, v| n.etag = v.to_string()),
    ("d:getlastmodified", |n, v| n.info.set_last_modified(v)),
    ("d:getcontenttype", |n, v| n.info.mimetype = v.to_string()),
    ("oc:permissions", |n, v| n.info.permissions = v.to_string()),
    ("oc:favorite", |n, v| n.info.favorite = to_int("oc:favorite", v) != 0),
    ("nc:trashbin-filename", |n, v| n.info.trashbin_filename = v.to_string()),
    ("nc:trashbin-original-location", |n, v| {
        n.info.trashbin_original_location = v.to_string()
    }),
    ("nc:trashbin-deletion-time", |n, v| {
        n.info.trashbin_deletion_time = to_int("nc:trashbin-deletion-time", v)
    }),
    ("nc:lock", |n, v| n.lock_info.is_locked = to_int("nc:lock", v) != 0),
    ("nc:lock-owner-type", |n, v| {
        n.lock_info.lock_type = LockType::from_i64(to_int("nc:lock-owner-type", v)).unwrap_or_default()
    }),
    ("nc:lock-owner", |n, v| n.lock_info.owner = v.to_string()),
    ("nc:lock-owner-displayname", |n, v| n.lock_info.owner_display_name = v.to_string()),
    ("nc:lock-owner-editor", |n, v| n.lock_info.owner_editor = v.to_string()),
    ("nc:lock-time", |n, v| n.lock_info.lock_time = to_int("nc:lock-time", v)),
    ("nc:lock-timeout", |n, v| n.lock_info.lock_ttl = to_int("nc:lock-timeout", v)),
];

fn to_int(key: &str, value: &str) -> i64 {
    value.trim().parse().unwrap_or_else(|_| {
        if !value.trim().is_empty() {
            debug!("multistatus: `{}` has non-numeric value {:?}", key, value);
        }
        0
    })
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Validate a multistatus reply and return its `d:response` records.
pub fn response_records(status: u16, body: &str, info: &str) -> NcResult<Vec<XmlElement>> {
    check_status(status, info)?;
    if status != 207 {
        return Err(NcError::malformed(status, "Response is not a multistatus.", info));
    }
    let root = xml::parse(body)
        .map_err(|e| NcError::malformed(status, format!("Response is not valid XML: {}", e), info))?;
    if root.name == "d:error" {
        let reason = format!(
            "{}: {}",
            root.child_text("s:exception").unwrap_or(""),
            root.child_text("s:message").unwrap_or("")
        )
        .replace('\n', "");
        return Err(NcError::malformed(status, reason, info));
    }
    if root.name != "d:multistatus" {
        return Err(NcError::malformed(status, "Response is not a multistatus.", info));
    }
    Ok(root.children.into_iter().filter(|c| c.name == "d:response").collect())
}

/// `d:prop` blocks of the propstats whose status reports "200 OK".
pub fn ok_props(record: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    record
        .children_named("d:propstat")
        .filter(|ps| ps.child_text("d:status").map(|s| s.contains("200 OK")).unwrap_or(false))
        .filter_map(|ps| ps.child("d:prop"))
}

/// Decoded href with the DAV suffix and leading slashes removed.
pub fn record_path(record: &XmlElement, dav_url_suffix: &str) -> String {
    let href = record.child_text("d:href").unwrap_or("");
    let decoded = percent_decode_str(href).decode_utf8_lossy();
    decoded.replace(dav_url_suffix, "").trim_start_matches('/').to_string()
}

// ── Record → node ────────────────────────────────────────────────────────────

pub fn parse_record(record: &XmlElement, dav_url_suffix: &str) -> FsNode {
    let mut node = FsNode::new(record_path(record, dav_url_suffix));
    for prop in ok_props(record) {
        for child in &prop.children {
            if let Some((_, set)) = PROPERTY_TABLE.iter().find(|(key, _)| *key == child.name) {
                set(&mut node, &child.text);
            }
        }
    }
    node
}

fn apply_version_mode(node: &mut FsNode, mode: PropFindType) {
    if node.etag.is_empty() {
        return;
    }
    node.full_path = node.full_path.trim_end_matches('/').to_string();
    node.info.is_version = true;
    let parent = node.full_path.rsplit('/').nth(1).unwrap_or("").to_string();
    if mode == PropFindType::VersionsFileId {
        node.info.fileid = to_int("versions parent", &parent);
        node.file_id = node.info.fileid.to_string();
    } else {
        node.file_id = parent;
    }
}

/// Parse every record, keeping nodes whose id is still unresolved.
pub fn parse_all(records: &[XmlElement], dav_url_suffix: &str, mode: PropFindType) -> Vec<FsNode> {
    records
        .iter()
        .map(|record| {
            let mut node = parse_record(record, dav_url_suffix);
            if matches!(mode, PropFindType::VersionsFileId | PropFindType::VersionsCompositeId) {
                apply_version_mode(&mut node, mode);
            }
            node
        })
        .collect()
}

/// Validate, parse, and drop nodes without a resolved `file_id`.
pub fn parse(status: u16, body: &str, info: &str, dav_url_suffix: &str, mode: PropFindType) -> NcResult<Vec<FsNode>> {
    let records = response_records(status, body, info)?;
    let nodes = parse_all(&records, dav_url_suffix, mode);
    Ok(nodes.into_iter().filter(|n| !n.file_id.is_empty()).collect())
}

/// Remove the first node that is the queried path itself.
pub fn exclude_self(nodes: &mut Vec<FsNode>, path: &str) {
    let wanted = path.trim_matches('/');
    if let Some(index) = nodes
        .iter()
        .position(|n| n.user_path().trim_end_matches('/') == wanted)
    {
        nodes.remove(index);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const SUFFIX: &str = "/remote.php/dav";

    fn listing() -> String {
        r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns">
 <d:response>
  <d:href>/remote.php/dav/files/admin/test%20dir/</d:href>
  <d:propstat>
   <d:prop>
    <d:getlastmodified>Sat, 29 Jul 2023 11:56:31 GMT</d:getlastmodified>
    <d:getetag>"64c4fe3f9b1b6"</d:getetag>
    <oc:size>12</oc:size>
    <oc:id>00000031ocbase</oc:id>
    <oc:fileid>31</oc:fileid>
    <oc:permissions>RGDNVCK</oc:permissions>
    <oc:favorite>0</oc:favorite>
   </d:prop>
   <d:status>HTTP/1.1 200 OK</d:status>
  </d:propstat>
  <d:propstat>
   <d:prop><d:getcontentlength/><d:getcontenttype/></d:prop>
   <d:status>HTTP/1.1 404 Not Found</d:status>
  </d:propstat>
 </d:response>
 <d:response>
  <d:href>/remote.php/dav/files/admin/test%20dir/%C3%B1.txt</d:href>
  <d:propstat>
   <d:prop>
    <d:getcontentlength>12</d:getcontentlength>
    <d:getcontenttype>text/plain</d:getcontenttype>
    <oc:id>00000032ocbase</oc:id>
    <oc:fileid>32</oc:fileid>
    <oc:permissions>RGDNVW</oc:permissions>
    <oc:favorite>1</oc:favorite>
    <nc:lock>1</nc:lock>
    <nc:lock-owner>admin</nc:lock-owner>
    <nc:lock-owner-type>1</nc:lock-owner-type>
   </d:prop>
   <d:status>HTTP/1.1 200 OK</d:status>
  </d:propstat>
 </d:response>
</d:multistatus>"#
            .to_string()
    }

    #[test]
    fn parses_records_in_order() {
        let nodes = parse(207, &listing(), "list", SUFFIX, PropFindType::Default).unwrap();
        assert_eq!(nodes.len(), 2);
        let dir = &nodes[0];
        assert_eq!(dir.full_path, "files/admin/test dir/");
        assert!(dir.is_dir());
        assert_eq!(dir.info.fileid, 31);
        assert_eq!(dir.info.size, 12);
        assert_eq!(dir.info.content_length, 0);
        assert_eq!(dir.etag, "\"64c4fe3f9b1b6\"");
        assert_eq!(dir.info.last_modified.to_rfc3339(), "2023-07-29T11:56:31+00:00");

        let file = &nodes[1];
        assert_eq!(file.name(), "ñ.txt");
        assert_eq!(file.user_path(), "test dir/ñ.txt");
        assert!(file.info.favorite);
        assert_eq!(file.info.mimetype, "text/plain");
        assert!(file.lock_info.is_locked);
        assert_eq!(file.lock_info.lock_type, LockType::CollaborativeLock);
    }

    #[test]
    fn non_ok_propstat_is_ignored() {
        let nodes = parse(207, &listing(), "list", SUFFIX, PropFindType::Default).unwrap();
        assert!(nodes[0].info.mimetype.is_empty());
    }

    #[test]
    fn single_response_is_a_list() {
        let body = r#"<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns"><d:response>
<d:href>/remote.php/dav/files/u/a.txt</d:href>
<d:propstat><d:prop><oc:id>5oc</oc:id></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
</d:response></d:multistatus>"#;
        let nodes = parse(207, body, "list", SUFFIX, PropFindType::Default).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].file_id, "5oc");
    }

    #[test]
    fn unresolved_records_are_dropped_by_parse() {
        let body = r#"<d:multistatus xmlns:d="DAV:"><d:response><d:href>/remote.php/dav/files/u/x</d:href>
<d:propstat><d:prop><d:getetag>e</d:getetag></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
</d:response></d:multistatus>"#;
        assert!(parse(207, body, "list", SUFFIX, PropFindType::Default).unwrap().is_empty());
        let records = response_records(207, body, "list").unwrap();
        assert_eq!(parse_all(&records, SUFFIX, PropFindType::Favorite).len(), 1);
    }

    #[test]
    fn dav_error_body() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<d:error xmlns:d="DAV:" xmlns:s="http://sabredav.org/ns">
  <s:exception>Sabre\DAV\Exception\BadRequest</s:exception>
  <s:message>Invalid
search</s:message>
</d:error>"#;
        let err = parse(207, body, "find: u", SUFFIX, PropFindType::Default).unwrap_err();
        match err {
            NcError::Malformed { reason, .. } => {
                assert_eq!(reason, "Sabre\\DAV\\Exception\\BadRequest: Invalidsearch")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wrong_status_is_malformed() {
        let err = parse(200, "<x/>", "list", SUFFIX, PropFindType::Default).unwrap_err();
        assert!(matches!(err, NcError::Malformed { status: 200, .. }));
        let err = parse(404, "", "list", SUFFIX, PropFindType::Default).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_xml_is_malformed() {
        let err = parse(207, "<d:multistatus", "list", SUFFIX, PropFindType::Default).unwrap_err();
        assert!(matches!(err, NcError::Malformed { .. }));
    }

    #[test]
    fn bad_integers_default_to_zero() {
        let body = r#"<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns"><d:response>
<d:href>/remote.php/dav/files/u/a</d:href>
<d:propstat><d:prop><oc:id>1oc</oc:id><oc:size>big</oc:size></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
</d:response></d:multistatus>"#;
        let nodes = parse(207, body, "list", SUFFIX, PropFindType::Default).unwrap();
        assert_eq!(nodes[0].info.size, 0);
    }

    #[test]
    fn version_records() {
        let body = r#"<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
<d:response><d:href>/remote.php/dav/versions/u/versions/77/</d:href>
<d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>
<d:response><d:href>/remote.php/dav/versions/u/versions/77/1690000000</d:href>
<d:propstat><d:prop><d:getetag>v1</d:getetag><d:getcontentlength>3</d:getcontentlength></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>
</d:multistatus>"#;
        let nodes = parse(207, body, "versions", SUFFIX, PropFindType::VersionsFileId).unwrap();
        assert_eq!(nodes.len(), 1);
        let v = &nodes[0];
        assert!(v.info.is_version);
        assert_eq!(v.info.fileid, 77);
        assert_eq!(v.file_id, "77");
        assert_eq!(v.full_path, "versions/u/versions/77/1690000000");

        let nodes = parse(207, body, "versions", SUFFIX, PropFindType::VersionsCompositeId).unwrap();
        assert_eq!(nodes[0].file_id, "77");
        assert_eq!(nodes[0].info.fileid, 0);
    }

    #[test]
    fn exclude_self_removes_one_match() {
        let mut nodes = vec![
            FsNode::with_identity("files/u/dir/", "1", ""),
            FsNode::with_identity("files/u/dir/a", "2", ""),
            FsNode::with_identity("files/u/dir/", "3", ""),
        ];
        exclude_self(&mut nodes, "/dir/");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].file_id, "2");
        assert_eq!(nodes[1].file_id, "3");
    }

    #[test]
    fn exclude_self_on_user_root() {
        let mut nodes = vec![
            FsNode::with_identity("files/u/", "1", ""),
            FsNode::with_identity("files/u/a", "2", ""),
        ];
        exclude_self(&mut nodes, "");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].file_id, "2");
    }
}
