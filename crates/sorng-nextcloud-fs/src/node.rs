// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · node
// ──────────────────────────────────────────────────────────────────────────────
// The file-system node model:
//  • FsNode          — identity + location of one remote entry
//  • FsNodeInfo      — extended metadata, always defaulted
//  • FsNodeLockInfo  — `files_lock` state
//  • PathRef         — "path or node" argument accepted by the files API
// ──────────────────────────────────────────────────────────────────────────────

use crate::types::LockType;
use chrono::{DateTime, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref USER_RE: Regex = Regex::new(r"(?:files|trashbin|versions)/([^/]+)/").unwrap();
    static ref USER_PATH_RE: Regex = Regex::new(r".*?(files|trashbin|versions)/([^/]+)/").unwrap();
}

/// Parse an HTTP-date; anything unparseable becomes the Unix epoch.
pub fn parse_http_date(value: &str) -> DateTime<Utc> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.with_timezone(&Utc);
    }
    let bare = value.strip_suffix(" GMT").unwrap_or(value);
    NaiveDateTime::parse_from_str(bare, "%a, %d %b %Y %H:%M:%S")
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

// ── Lock info ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsNodeLockInfo {
    pub is_locked: bool,
    pub lock_type: LockType,
    /// User id of the lock owner.
    pub owner: String,
    pub owner_display_name: String,
    /// App id owning a collaborative lock.
    pub owner_editor: String,
    /// Lock creation time, Unix seconds.
    pub lock_time: i64,
    /// Seconds from creation; 0 means no expiry.
    pub lock_ttl: i64,
}

impl FsNodeLockInfo {
    pub fn lock_creation_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.lock_time, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

// ── Extended info ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsNodeInfo {
    /// For directories the size of all content; equals `content_length` for files.
    pub size: i64,
    /// Length in bytes, zero for directories.
    pub content_length: i64,
    pub permissions: String,
    pub favorite: bool,
    /// Clear numeric id, without the instance id.
    pub fileid: i64,
    pub last_modified: DateTime<Utc>,
    /// Empty for directories.
    pub mimetype: String,
    pub is_version: bool,
    pub trashbin_filename: String,
    pub trashbin_original_location: String,
    pub trashbin_deletion_time: i64,
}

impl Default for FsNodeInfo {
    fn default() -> Self {
        Self {
            size: 0,
            content_length: 0,
            permissions: String::new(),
            favorite: false,
            fileid: 0,
            last_modified: DateTime::UNIX_EPOCH,
            mimetype: String::new(),
            is_version: false,
            trashbin_filename: String::new(),
            trashbin_original_location: String::new(),
            trashbin_deletion_time: 0,
        }
    }
}

impl FsNodeInfo {
    pub fn set_last_modified(&mut self, http_date: &str) {
        self.last_modified = parse_http_date(http_date);
    }

    pub fn in_trash(&self) -> bool {
        !self.trashbin_filename.is_empty()
            || !self.trashbin_original_location.is_empty()
            || self.trashbin_deletion_time != 0
    }
}

// ── Node ─────────────────────────────────────────────────────────────────────

/// One remote file-system entry.
///
/// `full_path` includes the root and user segments (`files/alice/a/b.txt`)
/// and ends with `/` iff the entry is a directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FsNode {
    pub full_path: String,
    /// Numeric id concatenated with the instance id; empty when unresolved.
    pub file_id: String,
    pub etag: String,
    pub info: FsNodeInfo,
    pub lock_info: FsNodeLockInfo,
}

impl FsNode {
    pub fn new(full_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            ..Default::default()
        }
    }

    pub fn with_identity(full_path: impl Into<String>, file_id: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            file_id: file_id.into(),
            etag: etag.into(),
            ..Default::default()
        }
    }

    pub fn is_dir(&self) -> bool {
        self.full_path.ends_with('/')
    }

    /// `true` when produced by a full property fetch rather than mkdir/upload.
    pub fn has_extra(&self) -> bool {
        !self.info.permissions.is_empty()
    }

    pub fn name(&self) -> &str {
        let trimmed = self.full_path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Owning user, taken from the path; empty if the path has no user segment.
    pub fn user(&self) -> &str {
        USER_RE
            .captures(&self.full_path)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or("")
    }

    /// Path relative to the user's root.
    pub fn user_path(&self) -> String {
        USER_PATH_RE.replace(&self.full_path, "").into_owned()
    }

    fn has_permission(&self, flag: &str) -> bool {
        self.info.permissions.contains(flag)
    }

    pub fn is_shared(&self) -> bool {
        self.has_permission("S")
    }

    pub fn is_shareable(&self) -> bool {
        self.has_permission("R")
    }

    pub fn is_mounted(&self) -> bool {
        self.has_permission("M")
    }

    pub fn is_readable(&self) -> bool {
        self.has_permission("G")
    }

    pub fn is_deletable(&self) -> bool {
        self.has_permission("D")
    }

    pub fn is_updatable(&self) -> bool {
        if self.is_dir() {
            self.has_permission("NV")
        } else {
            self.has_permission("W")
        }
    }

    pub fn is_creatable(&self) -> bool {
        self.is_dir() && self.has_permission("CK")
    }
}

/// Identity requires a resolved id on both sides.
impl PartialEq for FsNode {
    fn eq(&self, other: &Self) -> bool {
        !self.file_id.is_empty() && self.file_id == other.file_id
    }
}

impl fmt::Display for FsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.info.is_version {
            return write!(
                f,
                "File version: `{}` for FileID={} last modified at {} with {} bytes size.",
                self.name(),
                self.file_id,
                self.info.last_modified,
                self.info.content_length
            );
        }
        write!(
            f,
            "{}: `{}` with id={} last modified at {} and {} permissions.",
            if self.is_dir() { "Dir" } else { "File" },
            self.name(),
            self.file_id,
            self.info.last_modified,
            self.info.permissions
        )
    }
}

// ── Path argument ────────────────────────────────────────────────────────────

/// A user-relative path, or a node whose `user_path` is used.
#[derive(Debug, Clone)]
pub enum PathRef {
    Path(String),
    Node(FsNode),
}

impl PathRef {
    pub fn user_path(&self) -> String {
        match self {
            Self::Path(p) => p.clone(),
            Self::Node(n) => n.user_path(),
        }
    }

    /// Name used as the restore target when moving out of the trash bin.
    pub fn restore_name(&self) -> String {
        match self {
            Self::Path(p) => p.split_once('/').map(|(_, rest)| rest).unwrap_or(p).to_string(),
            Self::Node(n) => n.name().to_string(),
        }
    }
}

impl From<&str> for PathRef {
    fn from(p: &str) -> Self {
        Self::Path(p.to_string())
    }
}

impl From<String> for PathRef {
    fn from(p: String) -> Self {
        Self::Path(p)
    }
}

impl From<&String> for PathRef {
    fn from(p: &String) -> Self {
        Self::Path(p.clone())
    }
}

impl From<FsNode> for PathRef {
    fn from(n: FsNode) -> Self {
        Self::Node(n)
    }
}

impl From<&FsNode> for PathRef {
    fn from(n: &FsNode) -> Self {
        Self::Node(n.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
