// ── Core error types ──
//
// User-facing errors from mistly-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<mistly_api::Error>`
// impl translates transport-layer errors into domain variants.
//
// Every variant that stems from user input carries that input verbatim
// (identifier, file path, or offending line).

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("site not found: {identifier}")]
    SiteNotFound { identifier: String },

    #[error("failed to look up site '{identifier}': {source}")]
    SiteLookupFailed {
        identifier: String,
        #[source]
        source: Box<CoreError>,
    },

    // ── Input errors ─────────────────────────────────────────────────
    /// Malformed or empty input. Always fatal to the whole parse.
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Operation errors ─────────────────────────────────────────────
    /// A batch assignment call failed. Recorded against every MAC of the batch.
    #[error("failed to assign devices to site '{site}': {source}")]
    AssignmentFailed {
        site: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("operation cancelled before the batch for site '{site}' was dispatched")]
    Cancelled { site: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to inventory API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Walk through lookup/assignment wrappers to the underlying cause.
    pub fn root(&self) -> &CoreError {
        match self {
            Self::SiteLookupFailed { source, .. } | Self::AssignmentFailed { source, .. } => {
                source.root()
            }
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mistly_api::Error> for CoreError {
    fn from(err: mistly_api::Error) -> Self {
        match err {
            mistly_api::Error::InvalidToken => CoreError::AuthenticationFailed {
                message: "Invalid API token".into(),
            },
            mistly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            mistly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            mistly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            mistly_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            mistly_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                status: Some(429),
            },
            mistly_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            mistly_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
        }
    }
}
