// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · trashbin
// ──────────────────────────────────────────────────────────────────────────────
// Trash-bin and file-version operations:
//  • list / restore / delete / cleanup of trashed entries
//  • list / restore of file versions
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{check_status, NcResult};
use crate::files::FilesApi;
use crate::node::{FsNode, PathRef};
use crate::search::PROPFIND_PROPERTIES;
use crate::transport::{encode_path, DavRequest, DavTransport, DavVerb};
use crate::types::PropFindType;

const TRASHBIN_PROPERTIES: &[&str] = &[
    "nc:trashbin-filename",
    "nc:trashbin-original-location",
    "nc:trashbin-deletion-time",
];

impl<T: DavTransport> FilesApi<T> {
    // ── Trash bin ────────────────────────────────────────────────────────

    pub async fn trashbin_list(&self) -> NcResult<Vec<FsNode>> {
        let properties: Vec<&str> = PROPFIND_PROPERTIES
            .iter()
            .chain(TRASHBIN_PROPERTIES)
            .copied()
            .collect();
        self.propfind_nodes("", &properties, 1, false, PropFindType::Trashbin)
            .await
    }

    /// Move a trashed entry back to its original location.
    pub async fn trashbin_restore(&self, path: impl Into<PathRef>) -> NcResult<()> {
        let path = path.into();
        let restore_name = path.restore_name();
        let path = path.user_path();
        let user = self.session.user();
        let destination = format!(
            "{}{}",
            self.session.dav_endpoint(),
            encode_path(&format!("/trashbin/{}/restore/{}", user, restore_name))
        );
        let resp = self
            .session
            .dav(
                DavRequest::verb(DavVerb::Move, format!("/trashbin/{}/{}", user, path))
                    .header("Destination", destination.clone()),
            )
            .await?;
        check_status(
            resp.status,
            &format!("trashbin_restore: user={}, src={}, dest={}", user, path, destination),
        )
    }

    /// Permanently delete one trashed entry; 404 is ignored with `not_fail`.
    pub async fn trashbin_delete(&self, path: impl Into<PathRef>, not_fail: bool) -> NcResult<()> {
        let path = path.into().user_path();
        let user = self.session.user();
        let resp = self
            .session
            .dav(DavRequest::new(
                reqwest::Method::DELETE,
                format!("/trashbin/{}/{}", user, path),
            ))
            .await?;
        if resp.status == 404 && not_fail {
            return Ok(());
        }
        check_status(resp.status, &format!("trashbin_delete: user={}, path={}", user, path))
    }

    /// Empty the trash bin.
    pub async fn trashbin_cleanup(&self) -> NcResult<()> {
        let user = self.session.user();
        let resp = self
            .session
            .dav(DavRequest::new(
                reqwest::Method::DELETE,
                format!("/trashbin/{}/trash", user),
            ))
            .await?;
        check_status(resp.status, &format!("trashbin_cleanup: user={}", user))
    }

    // ── Versions ─────────────────────────────────────────────────────────

    /// Versions of `file`, addressed by clear id when known.
    pub async fn get_versions(&self, file: &FsNode) -> NcResult<Vec<FsNode>> {
        let (id, mode) = if file.info.fileid != 0 {
            (file.info.fileid.to_string(), PropFindType::VersionsFileId)
        } else {
            (file.file_id.clone(), PropFindType::VersionsCompositeId)
        };
        self.propfind_nodes(&id, PROPFIND_PROPERTIES, 1, false, mode).await
    }

    /// Make `version` (from [`get_versions`](Self::get_versions)) the current content.
    pub async fn restore_version(&self, version: &FsNode) -> NcResult<()> {
        let user = self.session.user();
        let destination = format!(
            "{}{}",
            self.session.dav_endpoint(),
            encode_path(&format!("/versions/{}/restore/{}", user, version.name()))
        );
        let src = version.user_path();
        let resp = self
            .session
            .dav(
                DavRequest::verb(DavVerb::Move, format!("/versions/{}/{}", user, src))
                    .header("Destination", destination),
            )
            .await?;
        check_status(resp.status, &format!("restore_version: user={}, src={}", user, src))
    }
}
