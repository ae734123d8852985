// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · types
// ──────────────────────────────────────────────────────────────────────────────
// Small value types used across the files API:
//  • LockType / FilePermissions
//  • SystemTag
//  • PropFindType (parser modes)
//  • search expression tokens
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{NcError, NcResult};
use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Locks ────────────────────────────────────────────────────────────────────

/// Lock kinds of the `files_lock` app.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LockType {
    #[default]
    ManualLock = 0,
    CollaborativeLock = 1,
    WebdavToken = 2,
}

impl LockType {
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::ManualLock),
            1 => Some(Self::CollaborativeLock),
            2 => Some(Self::WebdavToken),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Self::ManualLock => 0,
            Self::CollaborativeLock => 1,
            Self::WebdavToken => 2,
        }
    }
}

// ── Permissions ──────────────────────────────────────────────────────────────

/// OCS integer permissions bitmap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilePermissions(pub u32);

impl FilePermissions {
    pub const READ: u32 = 1;
    pub const UPDATE: u32 = 2;
    pub const CREATE: u32 = 4;
    pub const DELETE: u32 = 8;
    pub const SHARE: u32 = 16;
    pub const ALL: u32 = 31;

    /// Convert to the WebDAV flag string (`RGDNVCK`-style).
    pub fn to_flag_string(&self, is_dir: bool) -> String {
        let mut r = String::new();
        if self.0 & Self::SHARE != 0 {
            r.push('R');
        }
        if self.0 & Self::READ != 0 {
            r.push('G');
        }
        if self.0 & Self::DELETE != 0 {
            r.push('D');
        }
        if self.0 & Self::UPDATE != 0 {
            r.push_str(if is_dir { "NV" } else { "NVW" });
        }
        if is_dir && self.0 & Self::CREATE != 0 {
            r.push_str("CK");
        }
        r
    }
}

/// Integer permissions to the flag string reported by PROPFIND.
pub fn permissions_to_str(permissions: u32, is_dir: bool) -> String {
    FilePermissions(permissions).to_flag_string(is_dir)
}

// ── System tags ──────────────────────────────────────────────────────────────

/// A collaborative ("system") tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemTag {
    pub tag_id: i64,
    pub display_name: String,
    pub user_visible: bool,
    pub user_assignable: bool,
}

impl SystemTag {
    /// Build from a `d:prop` element; `None` when `oc:id` is missing or not numeric.
    pub fn from_prop(prop: &XmlElement) -> Option<Self> {
        let tag_id = prop.child_text("oc:id")?.trim().parse::<i64>().ok()?;
        let flag = |name: &str| {
            prop.child_text(name)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };
        Some(Self {
            tag_id,
            display_name: prop
                .child_text("oc:display-name")
                .map(str::to_string)
                .unwrap_or_else(|| tag_id.to_string()),
            user_visible: flag("oc:user-visible"),
            user_assignable: flag("oc:user-assignable"),
        })
    }
}

impl fmt::Display for SystemTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<SystemTag id={}, name={}>", self.tag_id, self.display_name)
    }
}

/// Accepts either a tag id or a tag object.
#[derive(Debug, Clone)]
pub enum TagRef {
    Id(i64),
    Tag(SystemTag),
}

impl TagRef {
    pub fn id(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::Tag(tag) => tag.tag_id,
        }
    }
}

impl From<i64> for TagRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<SystemTag> for TagRef {
    fn from(tag: SystemTag) -> Self {
        Self::Tag(tag)
    }
}

impl From<&SystemTag> for TagRef {
    fn from(tag: &SystemTag) -> Self {
        Self::Tag(tag.clone())
    }
}

// ── Parser modes ─────────────────────────────────────────────────────────────

/// How the multistatus parser post-processes each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropFindType {
    #[default]
    Default,
    /// Favorites report; bare entries are repaired by a path lookup.
    Favorite,
    Trashbin,
    /// Version listing addressed by clear numeric file id.
    VersionsFileId,
    /// Version listing addressed by composite file id.
    VersionsCompositeId,
}

// ── Search tokens ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOp {
    Eq,
    Like,
    Gt,
    Gte,
    Lt,
}

impl SearchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Like => "like",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
        }
    }
}

impl FromStr for SearchOp {
    type Err = NcError;

    fn from_str(s: &str) -> NcResult<Self> {
        match s {
            "eq" => Ok(Self::Eq),
            "like" => Ok(Self::Like),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            other => Err(NcError::invalid(format!("unknown search operator `{}`", other))),
        }
    }
}

/// Searchable property keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProp {
    Name,
    Mime,
    LastModified,
    Size,
    Favorite,
    FileId,
}

impl SearchProp {
    /// Qualified WebDAV property name.
    pub fn dav_name(&self) -> &'static str {
        match self {
            Self::Name => "d:displayname",
            Self::Mime => "d:getcontenttype",
            Self::LastModified => "d:getlastmodified",
            Self::Size => "oc:size",
            Self::Favorite => "oc:favorite",
            Self::FileId => "oc:fileid",
        }
    }
}

impl FromStr for SearchProp {
    type Err = NcError;

    fn from_str(s: &str) -> NcResult<Self> {
        match s {
            "name" => Ok(Self::Name),
            "mime" => Ok(Self::Mime),
            "last_modified" => Ok(Self::LastModified),
            "size" => Ok(Self::Size),
            "favorite" => Ok(Self::Favorite),
            "fileid" => Ok(Self::FileId),
            other => Err(NcError::invalid(format!("unknown search property `{}`", other))),
        }
    }
}

/// One element of a prefix-notation search expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchToken {
    And,
    Or,
    Leaf {
        op: SearchOp,
        prop: SearchProp,
        value: String,
    },
}

impl SearchToken {
    pub fn leaf(op: SearchOp, prop: SearchProp, value: impl ToString) -> Self {
        Self::Leaf {
            op,
            prop,
            value: value.to_string(),
        }
    }

    pub fn eq(prop: SearchProp, value: impl ToString) -> Self {
        Self::leaf(SearchOp::Eq, prop, value)
    }

    pub fn like(prop: SearchProp, value: impl ToString) -> Self {
        Self::leaf(SearchOp::Like, prop, value)
    }

    /// Tokenise a flat word list such as `["and", "gt", "size", "0", "like", "mime", "image/%"]`.
    pub fn parse_flat(words: &[&str]) -> NcResult<Vec<SearchToken>> {
        let mut out = Vec::new();
        let mut it = words.iter();
        while let Some(word) = it.next() {
            match *word {
                "and" => out.push(Self::And),
                "or" => out.push(Self::Or),
                op => {
                    let op = op.parse::<SearchOp>()?;
                    let prop = it
                        .next()
                        .ok_or_else(|| NcError::invalid("search leaf is missing its property"))?
                        .parse::<SearchProp>()?;
                    let value = it
                        .next()
                        .ok_or_else(|| NcError::invalid("search leaf is missing its value"))?;
                    out.push(Self::leaf(op, prop, value));
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for SearchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
            Self::Leaf { op, prop, value } => {
                write!(f, "{} {} {}", op.as_str(), prop.dav_name(), value)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
