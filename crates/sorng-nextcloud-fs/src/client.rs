// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · client
// ──────────────────────────────────────────────────────────────────────────────
// reqwest-backed session implementing the DavTransport seam:
//  • user mode (basic auth or bearer token)
//  • app mode (AppAPI headers, switchable acting user)
//  • buffered and streaming WebDAV requests
//  • adapter restart (fresh connection pool)
// ──────────────────────────────────────────────────────────────────────────────

use crate::config::{masked, AppConfig, NcConfig, NcOptions};
use crate::error::{NcError, NcResult};
use crate::transport::{encode_path, DavRequest, DavResponse, DavStreamResponse, DavTransport};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use std::fmt;
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

#[derive(Clone)]
enum Credentials {
    User {
        password: String,
        bearer_token: Option<String>,
    },
    App {
        app_id: String,
        app_version: String,
        app_secret: String,
        aa_version: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User {
                password,
                bearer_token,
            } => f
                .debug_struct("User")
                .field("password", &masked(password))
                .field("bearer_token", &bearer_token.as_deref().map(masked))
                .finish(),
            Self::App {
                app_id,
                app_version,
                app_secret,
                aa_version,
            } => f
                .debug_struct("App")
                .field("app_id", app_id)
                .field("app_version", app_version)
                .field("app_secret", &masked(app_secret))
                .field("aa_version", aa_version)
                .finish(),
        }
    }
}

/// HTTP session for one user or one app.
///
/// The acting user and the pooled client sit behind locks so a session shared
/// through `FilesApi` can still switch users or restart its adapter.
pub struct NcSession {
    http: RwLock<Client>,
    endpoint: String,
    dav_url_suffix: String,
    user: RwLock<String>,
    credentials: Credentials,
    options: NcOptions,
}

impl Clone for NcSession {
    fn clone(&self) -> Self {
        Self {
            http: RwLock::new(self.client()),
            endpoint: self.endpoint.clone(),
            dav_url_suffix: self.dav_url_suffix.clone(),
            user: RwLock::new(self.current_user()),
            credentials: self.credentials.clone(),
            options: self.options.clone(),
        }
    }
}

impl fmt::Debug for NcSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NcSession")
            .field("endpoint", &self.endpoint)
            .field("dav_url_suffix", &self.dav_url_suffix)
            .field("user", &self.current_user())
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl NcSession {
    // ── Constructors ─────────────────────────────────────────────────────

    pub fn new(config: NcConfig) -> NcResult<Self> {
        validate_endpoint(&config.endpoint())?;
        let http = build_client(&config.options)?;
        Ok(Self {
            http: RwLock::new(http),
            endpoint: config.endpoint(),
            dav_url_suffix: config.dav_url_suffix,
            user: RwLock::new(config.user),
            credentials: Credentials::User {
                password: config.password,
                bearer_token: config.bearer_token,
            },
            options: config.options,
        })
    }

    pub fn new_app(config: AppConfig) -> NcResult<Self> {
        validate_endpoint(&config.endpoint())?;
        let http = build_client(&config.options)?;
        Ok(Self {
            http: RwLock::new(http),
            endpoint: config.endpoint(),
            dav_url_suffix: config.dav_url_suffix,
            user: RwLock::new(config.user),
            credentials: Credentials::App {
                app_id: config.app_id,
                app_version: config.app_version,
                app_secret: config.app_secret,
                aa_version: config.aa_version,
            },
            options: config.options,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn options(&self) -> &NcOptions {
        &self.options
    }

    pub fn is_app(&self) -> bool {
        matches!(self.credentials, Credentials::App { .. })
    }

    /// Switch the acting user (app mode); user mode keeps its own login.
    pub fn set_user(&self, user: &str) {
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = user.to_string();
    }

    /// Drop the pooled connections and start with a fresh client.
    pub fn restart_adapter(&self) -> NcResult<()> {
        info!("nextcloud: restarting HTTP adapter for {}", self.endpoint);
        let http = build_client(&self.options)?;
        *self.http.write().unwrap_or_else(|e| e.into_inner()) = http;
        Ok(())
    }

    fn current_user(&self) -> String {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn client(&self) -> Client {
        self.http.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    // ── Request building ─────────────────────────────────────────────────

    fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
        let user = self.current_user();
        match &self.credentials {
            Credentials::User {
                bearer_token: Some(tok),
                ..
            } => req.bearer_auth(tok),
            Credentials::User { password, .. } => req.basic_auth(&user, Some(password)),
            Credentials::App {
                app_id,
                app_version,
                app_secret,
                aa_version,
            } => req
                .header("EX-APP-ID", app_id)
                .header("EX-APP-VERSION", app_version)
                .header("AA-VERSION", aa_version)
                .header(
                    "AUTHORIZATION-APP-API",
                    STANDARD.encode(format!("{}:{}", user, app_secret)),
                ),
        }
    }

    fn build(&self, request: DavRequest) -> RequestBuilder {
        let url = format!("{}{}", self.dav_endpoint(), encode_path(&request.path));
        let mut req = self
            .client()
            .request(request.method, &url)
            .timeout(Duration::from_secs(self.options.timeout_dav_secs))
            .header("OCS-APIRequest", "true");
        for (k, v) in &self.options.custom_headers {
            req = req.header(k, v);
        }
        for (k, v) in request.headers {
            req = req.header(k, v);
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }
        self.apply_auth(req)
    }
}

fn validate_endpoint(endpoint: &str) -> NcResult<()> {
    let url = Url::parse(endpoint).map_err(|e| NcError::invalid(format!("invalid nextcloud_url `{}`: {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(NcError::invalid(format!("unsupported URL scheme `{}`", other))),
    }
}

fn build_client(options: &NcOptions) -> NcResult<Client> {
    Ok(Client::builder()
        .danger_accept_invalid_certs(!options.verify_certificate)
        .connect_timeout(Duration::from_secs(options.timeout_secs))
        .build()?)
}

#[async_trait]
impl DavTransport for NcSession {
    fn user(&self) -> String {
        self.current_user()
    }

    fn dav_endpoint(&self) -> String {
        format!("{}{}", self.endpoint, self.dav_url_suffix)
    }

    fn dav_url_suffix(&self) -> String {
        self.dav_url_suffix.clone()
    }

    async fn dav(&self, request: DavRequest) -> NcResult<DavResponse> {
        let line = format!("{} {}", request.method, request.path);
        let resp = self.build(request).send().await?;
        let status = resp.status().as_u16();
        debug!("dav: {} -> {}", line, status);
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(DavResponse {
            status,
            headers,
            body,
        })
    }

    async fn dav_stream(&self, request: DavRequest) -> NcResult<DavStreamResponse> {
        let line = format!("{} {}", request.method, request.path);
        let resp = self.build(request).send().await?;
        let status = resp.status().as_u16();
        debug!("dav (stream): {} -> {}", line, status);
        let headers = resp.headers().clone();
        let body = resp.bytes_stream().map(|chunk| chunk.map_err(NcError::from)).boxed();
        Ok(DavStreamResponse {
            status,
            headers,
            body,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
