// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · error
// ──────────────────────────────────────────────────────────────────────────────
// Error taxonomy shared by every public operation:
//  • Transport failures (connect / DNS / TLS / timeout)
//  • HTTP status failures with a request descriptor
//  • Malformed WebDAV responses
//  • Local contract violations raised before any request
// ──────────────────────────────────────────────────────────────────────────────

use reqwest::StatusCode;
use thiserror::Error;

/// Convenience alias used by every public function in this crate.
pub type NcResult<T> = Result<T, NcError>;

/// Structured error returned by the file-system layer.
#[derive(Debug, Error)]
pub enum NcError {
    /// The request never produced a status code.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The server answered with a non-success status.
    #[error("[{status}] {reason} <{info}>")]
    Status {
        status: u16,
        reason: String,
        info: String,
    },

    /// The server answered 404.
    #[error("[404] Not found <{info}>")]
    NotFound { info: String },

    /// A multistatus was expected but the body was not one, or it carried `d:error`.
    #[error("[{status}] {reason} <{info}>")]
    Malformed {
        status: u16,
        reason: String,
        info: String,
    },

    /// Invalid argument combination, detected locally.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Local sink / source failure during a streaming transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NcError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(info: impl Into<String>) -> Self {
        Self::NotFound { info: info.into() }
    }

    pub fn malformed(status: u16, reason: impl Into<String>, info: impl Into<String>) -> Self {
        Self::Malformed {
            status,
            reason: reason.into(),
            info: info.into(),
        }
    }

    /// HTTP status attached to the error, if the server produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Malformed { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for NcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::transport(format!("connection failed: {}", err))
        } else {
            Self::transport(format!("HTTP error: {}", err))
        }
    }
}

/// Fail on any HTTP error status, passing 1xx / 2xx / 3xx through.
///
/// Nextcloud uses the pseudo-codes 996..=999 for internal failures; those are
/// reported with fixed phrases.
pub fn check_status(status: u16, info: &str) -> NcResult<()> {
    let phrase = match status {
        996 => Some("Server error"),
        997 => Some("Unauthorised"),
        998 => Some("Not found"),
        999 => Some("Unknown error"),
        _ => None,
    };
    if let Some(phrase) = phrase {
        return Err(NcError::Status {
            status,
            reason: phrase.to_string(),
            info: info.to_string(),
        });
    }
    if status < 400 {
        return Ok(());
    }
    if status == 404 {
        return Err(NcError::not_found(info));
    }
    Err(NcError::Status {
        status,
        reason: reason_phrase(status),
        info: info.to_string(),
    })
}

fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
