//! # SortOfRemote NG – Nextcloud File System
//!
//! Async access to the file tree of a Nextcloud instance over WebDAV:
//!
//! - **Listing & search** — PROPFIND listings, SEARCH expressions, lookup by id or path
//! - **Transfers** — buffered and streaming download, single-PUT and chunked upload
//! - **Tree changes** — mkdir / makedirs / delete / move / copy
//! - **Favorites** — REPORT listings with path repair, PROPPATCH toggling
//! - **Trash bin & versions** — list, restore, delete, cleanup
//! - **System tags** — create, update, delete, assign, unassign
//! - **Locks** — `files_lock` LOCK / UNLOCK
//!
//! Every operation goes through the [`DavTransport`] seam, implemented for
//! real servers by [`NcSession`] (user or app mode).

pub mod error;
pub mod config;
pub mod transport;
pub mod client;
pub mod xml;
pub mod types;
pub mod node;
pub mod search;
pub mod multistatus;
pub mod files;
pub mod trashbin;
pub mod tags;

pub use client::NcSession;
pub use config::{AppConfig, NcConfig, NcOptions};
pub use error::{NcError, NcResult};
pub use files::FilesApi;
pub use node::{FsNode, FsNodeInfo, FsNodeLockInfo, PathRef};
pub use tags::FileIdRef;
pub use transport::{DavRequest, DavResponse, DavStreamResponse, DavTransport, DavVerb};
pub use types::{
    permissions_to_str, FilePermissions, LockType, PropFindType, SearchOp, SearchProp, SearchToken, SystemTag,
    TagRef,
};
