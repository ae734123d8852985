// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · tags
// ──────────────────────────────────────────────────────────────────────────────
// Collaborative ("system") tags:
//  • listing, creation, update and deletion of tags
//  • assigning tags to files and reading them back
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{check_status, NcError, NcResult};
use crate::files::FilesApi;
use crate::multistatus;
use crate::node::FsNode;
use crate::transport::{DavRequest, DavTransport, DavVerb};
use crate::types::{SystemTag, TagRef};
use crate::xml::{XmlElement, NS_DAV, NS_OWNCLOUD};
use serde::Serialize;

const TAG_PROPERTIES: &[&str] = &["oc:id", "oc:display-name", "oc:user-visible", "oc:user-assignable"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTagBody<'a> {
    name: &'a str,
    user_visible: bool,
    user_assignable: bool,
}

fn bool_text(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

pub fn build_list_tags_body() -> XmlElement {
    XmlElement::new("d:propfind")
        .with_attr("xmlns:d", NS_DAV)
        .with_attr("xmlns:oc", NS_OWNCLOUD)
        .with_child(crate::search::prop_list(TAG_PROPERTIES))
}

/// `PROPPATCH` body for the provided fields; at least one is required.
pub fn build_update_tag_body(
    name: Option<&str>,
    user_visible: Option<bool>,
    user_assignable: Option<bool>,
) -> NcResult<XmlElement> {
    let mut prop = XmlElement::new("d:prop");
    if let Some(name) = name {
        prop.push(XmlElement::new("oc:display-name").with_text(name));
    }
    if let Some(v) = user_visible {
        prop.push(XmlElement::new("oc:user-visible").with_text(bool_text(v)));
    }
    if let Some(v) = user_assignable {
        prop.push(XmlElement::new("oc:user-assignable").with_text(bool_text(v)));
    }
    if prop.children.is_empty() {
        return Err(NcError::invalid("No property specified to change."));
    }
    Ok(XmlElement::new("d:propertyupdate")
        .with_attr("xmlns:d", NS_DAV)
        .with_attr("xmlns:oc", NS_OWNCLOUD)
        .with_child(XmlElement::new("d:set").with_child(prop)))
}

/// Accepts a clear file id or a node carrying one.
#[derive(Debug, Clone)]
pub enum FileIdRef {
    Id(i64),
    Node(FsNode),
}

impl FileIdRef {
    pub fn fileid(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::Node(node) => node.info.fileid,
        }
    }
}

impl From<i64> for FileIdRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&FsNode> for FileIdRef {
    fn from(node: &FsNode) -> Self {
        Self::Node(node.clone())
    }
}

impl From<FsNode> for FileIdRef {
    fn from(node: FsNode) -> Self {
        Self::Node(node)
    }
}

impl<T: DavTransport> FilesApi<T> {
    pub async fn list_tags(&self) -> NcResult<Vec<SystemTag>> {
        let resp = self
            .session
            .dav(DavRequest::verb(DavVerb::Propfind, "/systemtags").xml(build_list_tags_body().to_document()))
            .await?;
        let records = multistatus::response_records(resp.status, &resp.text(), "list_tags")?;
        Ok(records
            .iter()
            .flat_map(|r| multistatus::ok_props(r).filter_map(SystemTag::from_prop).collect::<Vec<_>>())
            .collect())
    }

    /// Tags assigned to a file or directory.
    pub async fn get_tags(&self, file: impl Into<FileIdRef>) -> NcResult<Vec<SystemTag>> {
        let fileid = file.into().fileid();
        let url = format!("/systemtags-relations/files/{}/", fileid);
        let resp = self.session.dav(DavRequest::verb(DavVerb::Propfind, url.clone())).await?;
        let records = multistatus::response_records(resp.status, &resp.text(), "get_tags")?;
        let suffix = self.session.dav_url_suffix();
        let self_path = format!("{}{}", suffix, url).trim_start_matches('/').to_string();
        let ids: Vec<i64> = records
            .iter()
            .filter(|record| {
                let href = record.child_text("d:href").unwrap_or("");
                href.trim_start_matches('/').trim_end_matches('/') != self_path.trim_end_matches('/')
            })
            .flat_map(|record| {
                multistatus::ok_props(record)
                    .filter_map(|prop| prop.child_text("oc:id").and_then(|v| v.trim().parse().ok()))
                    .collect::<Vec<i64>>()
            })
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .list_tags()
            .await?
            .into_iter()
            .filter(|tag| ids.contains(&tag.tag_id))
            .collect())
    }

    pub async fn create_tag(&self, name: &str, user_visible: bool, user_assignable: bool) -> NcResult<()> {
        let body = serde_json::to_vec(&CreateTagBody {
            name,
            user_visible,
            user_assignable,
        })
        .map_err(|e| NcError::invalid(e.to_string()))?;
        let resp = self
            .session
            .dav(
                DavRequest::new(reqwest::Method::POST, "/systemtags")
                    .header("Content-Type", "application/json")
                    .body(body),
            )
            .await?;
        check_status(resp.status, &format!("create_tag({})", name))
    }

    pub async fn update_tag(
        &self,
        tag: impl Into<TagRef>,
        name: Option<&str>,
        user_visible: Option<bool>,
        user_assignable: Option<bool>,
    ) -> NcResult<()> {
        let tag_id = tag.into().id();
        let body = build_update_tag_body(name, user_visible, user_assignable)?;
        let resp = self
            .session
            .dav(DavRequest::verb(DavVerb::Proppatch, format!("/systemtags/{}", tag_id)).xml(body.to_document()))
            .await?;
        check_status(resp.status, &format!("update_tag({})", tag_id))
    }

    pub async fn delete_tag(&self, tag: impl Into<TagRef>) -> NcResult<()> {
        let tag_id = tag.into().id();
        let resp = self
            .session
            .dav(DavRequest::new(reqwest::Method::DELETE, format!("/systemtags/{}", tag_id)))
            .await?;
        check_status(resp.status, &format!("delete_tag({})", tag_id))
    }

    pub async fn tag_by_name(&self, tag_name: &str) -> NcResult<SystemTag> {
        self.list_tags()
            .await?
            .into_iter()
            .find(|t| t.display_name == tag_name)
            .ok_or_else(|| NcError::not_found(format!("Tag with name='{}' not found.", tag_name)))
    }

    pub async fn assign_tag(&self, file: impl Into<FileIdRef>, tag: impl Into<TagRef>) -> NcResult<()> {
        self.change_tag_state(file.into(), tag.into(), true).await
    }

    pub async fn unassign_tag(&self, file: impl Into<FileIdRef>, tag: impl Into<TagRef>) -> NcResult<()> {
        self.change_tag_state(file.into(), tag.into(), false).await
    }

    async fn change_tag_state(&self, file: FileIdRef, tag: TagRef, assign: bool) -> NcResult<()> {
        let fileid = file.fileid();
        let tag_id = tag.id();
        let method = if assign {
            reqwest::Method::PUT
        } else {
            reqwest::Method::DELETE
        };
        let resp = self
            .session
            .dav(DavRequest::new(
                method,
                format!("/systemtags-relations/files/{}/{}", fileid, tag_id),
            ))
            .await?;
        let info = if assign {
            format!("(Adding `{}` to {})", tag_id, fileid)
        } else {
            format!("(Removing `{}` from {})", tag_id, fileid)
        };
        check_status(resp.status, &info)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
