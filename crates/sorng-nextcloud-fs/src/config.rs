// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · config
// ──────────────────────────────────────────────────────────────────────────────
// Connection configuration for both operating modes:
//  • NcConfig   — direct end-user credentials
//  • AppConfig  — an app proxied through the AppAPI broker
//  • NcOptions  — runtime behaviour shared by both (timeouts, chunking, …)
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{NcError, NcResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_DAV_URL_SUFFIX: &str = "/remote.php/dav";
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;
pub const DEFAULT_UPLOAD_ROOT: &str = "/uploads";
/// Smallest piece size the server accepts for the v2 chunked-upload layout.
pub const CHUNK_V2_MIN_SIZE: usize = 5 * 1024 * 1024;

// ── Options ──────────────────────────────────────────────────────────────────

/// Runtime options applied by the session and the files API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NcOptions {
    /// Timeout for OCS requests, seconds.
    pub timeout_secs: u64,
    /// Timeout for WebDAV requests, seconds.
    pub timeout_dav_secs: u64,
    /// Default piece size for streaming upload / download.
    pub chunk_size: usize,
    /// DAV collection under which chunked uploads are staged.
    pub upload_root: String,
    /// Use the v2 chunk layout when `chunk_size` is at least 5 MiB.
    pub upload_chunk_v2: bool,
    /// Set to `false` for self-signed certificates.
    pub verify_certificate: bool,
    /// Extra headers sent with every request.
    pub custom_headers: HashMap<String, String>,
}

impl Default for NcOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 50,
            timeout_dav_secs: 150,
            chunk_size: DEFAULT_CHUNK_SIZE,
            upload_root: DEFAULT_UPLOAD_ROOT.to_string(),
            upload_chunk_v2: false,
            verify_certificate: true,
            custom_headers: HashMap::new(),
        }
    }
}

// ── User mode ────────────────────────────────────────────────────────────────

/// Credentials and endpoints for a direct end-user client.
#[derive(Clone, Serialize, Deserialize)]
pub struct NcConfig {
    /// Base URL of the instance, e.g. `https://cloud.example.com`.
    pub nextcloud_url: String,
    pub user: String,
    /// App password (preferred) or regular password.
    pub password: String,
    /// OAuth2 bearer token; takes priority over basic auth when set.
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default = "default_dav_url_suffix")]
    pub dav_url_suffix: String,
    #[serde(default)]
    pub options: NcOptions,
}

impl NcConfig {
    pub fn new(nextcloud_url: &str, user: &str, password: &str) -> Self {
        Self {
            nextcloud_url: nextcloud_url.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            bearer_token: None,
            dav_url_suffix: default_dav_url_suffix(),
            options: NcOptions::default(),
        }
    }

    /// Load from `NEXTCLOUD_URL`, `NC_AUTH_USER`, `NC_AUTH_PASS` and the
    /// optional `DAV_URL_SUFFIX`.
    pub fn from_env() -> NcResult<Self> {
        let mut cfg = Self::new(
            &required_env("NEXTCLOUD_URL")?,
            &required_env("NC_AUTH_USER")?,
            &required_env("NC_AUTH_PASS")?,
        );
        if let Some(suffix) = optional_env("DAV_URL_SUFFIX") {
            cfg.dav_url_suffix = suffix;
        }
        Ok(cfg)
    }

    pub fn endpoint(&self) -> String {
        normalize_endpoint(&self.nextcloud_url)
    }

    pub fn dav_endpoint(&self) -> String {
        format!("{}{}", self.endpoint(), self.dav_url_suffix)
    }
}

// ── App mode ─────────────────────────────────────────────────────────────────

/// Identity of an application whose calls are proxied by the AppAPI broker.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub nextcloud_url: String,
    pub app_id: String,
    pub app_version: String,
    pub app_secret: String,
    #[serde(default = "default_aa_version")]
    pub aa_version: String,
    /// Acting user; may stay empty for system-level calls.
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_dav_url_suffix")]
    pub dav_url_suffix: String,
    #[serde(default)]
    pub options: NcOptions,
}

impl AppConfig {
    pub fn new(nextcloud_url: &str, app_id: &str, app_version: &str, app_secret: &str) -> Self {
        Self {
            nextcloud_url: nextcloud_url.to_string(),
            app_id: app_id.to_string(),
            app_version: app_version.to_string(),
            app_secret: app_secret.to_string(),
            aa_version: default_aa_version(),
            user: String::new(),
            dav_url_suffix: default_dav_url_suffix(),
            options: NcOptions::default(),
        }
    }

    /// Load from `NEXTCLOUD_URL`, `APP_ID`, `APP_VERSION`, `APP_SECRET` and the
    /// optional `AA_VERSION` / `DAV_URL_SUFFIX`.
    pub fn from_env() -> NcResult<Self> {
        let mut cfg = Self::new(
            &required_env("NEXTCLOUD_URL")?,
            &required_env("APP_ID")?,
            &required_env("APP_VERSION")?,
            &required_env("APP_SECRET")?,
        );
        if let Some(v) = optional_env("AA_VERSION") {
            cfg.aa_version = v;
        }
        if let Some(suffix) = optional_env("DAV_URL_SUFFIX") {
            cfg.dav_url_suffix = suffix;
        }
        Ok(cfg)
    }

    pub fn endpoint(&self) -> String {
        normalize_endpoint(&self.nextcloud_url)
    }

    pub fn dav_endpoint(&self) -> String {
        format!("{}{}", self.endpoint(), self.dav_url_suffix)
    }
}

// ── Debug ────────────────────────────────────────────────────────────────────

/// Stand-in printed for a secret in `Debug` output.
pub(crate) fn masked(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "****"
    }
}

impl fmt::Debug for NcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NcConfig")
            .field("nextcloud_url", &self.nextcloud_url)
            .field("user", &self.user)
            .field("password", &masked(&self.password))
            .field("bearer_token", &self.bearer_token.as_deref().map(masked))
            .field("dav_url_suffix", &self.dav_url_suffix)
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("nextcloud_url", &self.nextcloud_url)
            .field("app_id", &self.app_id)
            .field("app_version", &self.app_version)
            .field("app_secret", &masked(&self.app_secret))
            .field("aa_version", &self.aa_version)
            .field("user", &self.user)
            .field("dav_url_suffix", &self.dav_url_suffix)
            .field("options", &self.options)
            .finish()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn default_dav_url_suffix() -> String {
    DEFAULT_DAV_URL_SUFFIX.to_string()
}

fn default_aa_version() -> String {
    "2.3.0".to_string()
}

/// Strip a trailing `/index.php` and `/` from the configured URL.
pub fn normalize_endpoint(url: &str) -> String {
    let url = url.strip_suffix("/index.php").unwrap_or(url);
    url.strip_suffix('/').unwrap_or(url).to_string()
}

fn required_env(name: &str) -> NcResult<String> {
    optional_env(name).ok_or_else(|| NcError::invalid(format!("`{}` is not found.", name.to_lowercase())))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_index_php() {
        assert_eq!(normalize_endpoint("https://nc.test/index.php"), "https://nc.test");
        assert_eq!(normalize_endpoint("https://nc.test/"), "https://nc.test");
        assert_eq!(normalize_endpoint("https://nc.test"), "https://nc.test");
    }

    #[test]
    fn dav_endpoint_uses_suffix() {
        let cfg = NcConfig::new("https://nc.test/", "alice", "pw");
        assert_eq!(cfg.dav_endpoint(), "https://nc.test/remote.php/dav");
    }

    #[test]
    fn options_defaults() {
        let o = NcOptions::default();
        assert_eq!(o.chunk_size, 4 * 1024 * 1024);
        assert_eq!(o.upload_root, "/uploads");
        assert!(!o.upload_chunk_v2);
        assert_eq!(o.timeout_dav_secs, 150);
        assert!(o.verify_certificate);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: NcConfig = serde_json::from_str(
            r#"{"nextcloud_url":"https://nc.test","user":"bob","password":"secret"}"#,
        )
        .unwrap();
        assert_eq!(cfg.dav_url_suffix, "/remote.php/dav");
        assert!(cfg.bearer_token.is_none());
        assert_eq!(cfg.options.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn debug_masks_secrets() {
        let user = format!("{:?}", NcConfig::new("https://nc.test", "alice", "hunter2-password"));
        assert!(user.contains("\"alice\""));
        assert!(!user.contains("hunter2-password"));
        let app = format!("{:?}", AppConfig::new("https://nc.test", "my_app", "1.0.0", "s3cr3t"));
        assert!(!app.contains("s3cr3t"));
        assert_eq!(masked(""), "");
    }

    #[test]
    fn app_config_defaults() {
        let cfg = AppConfig::new("https://nc.test", "my_app", "1.0.0", "s3cr3t");
        assert_eq!(cfg.aa_version, "2.3.0");
        assert!(cfg.user.is_empty());
        assert_eq!(cfg.dav_endpoint(), "https://nc.test/remote.php/dav");
    }
}
