//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use mistly_config::ConfigError;
use mistly_core::{CoreError, SharedError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the API at {url}")]
    #[diagnostic(
        code(mistly::connection_failed),
        help(
            "Check network access and the api_url of your profile.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(mistly::timeout),
        help("Increase the timeout with --timeout or in your profile.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(mistly::auth_failed),
        help(
            "Verify your API token and that it has access to the organization.\n\
             Store a new one with: mistly config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No API token configured for profile '{profile}'")]
    #[diagnostic(
        code(mistly::no_credentials),
        help(
            "Store one with: mistly config set-token\n\
             Or set the MISTLY_API_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} not found: {identifier}")]
    #[diagnostic(
        code(mistly::not_found),
        help("Run: mistly {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Failed to look up site '{identifier}'")]
    #[diagnostic(code(mistly::lookup_failed))]
    LookupFailed {
        identifier: String,
        #[source]
        source: Box<CliError>,
    },

    // ── Bulk assignment ──────────────────────────────────────────────
    #[error("{failed} of {total} devices could not be assigned")]
    #[diagnostic(code(mistly::assignment_failed))]
    AssignmentFailed {
        failed: usize,
        total: usize,
        #[source]
        source: SharedError,
    },

    #[error("{0}")]
    #[diagnostic(code(mistly::cancelled))]
    Cancelled(String),

    // ── Input ────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(mistly::invalid_input),
        help("MAC files hold one MAC per line; CSV files hold MAC,SiteName lines.")
    )]
    InvalidInput { message: String },

    #[error("Failed to read {}", .path.display())]
    #[diagnostic(code(mistly::read_input))]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(mistly::api_error))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mistly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(mistly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: mistly config set org_id <ORG> --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No profile configured and no --org given")]
    #[diagnostic(
        code(mistly::no_config),
        help(
            "Pass --org and --api-token, or create a profile with: mistly config set org_id <ORG>\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(mistly::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(mistly::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::LookupFailed { source, .. } => source.exit_code(),
            Self::AssignmentFailed { source, .. } => {
                CliError::from_core_ref(source.root()).exit_code()
            }
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Exit-code classification of a borrowed core error.
    fn from_core_ref(err: &CoreError) -> CliError {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                message: message.clone(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::SiteNotFound { identifier } => not_found_site(identifier.clone()),
            other => CliError::ApiError {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

fn not_found_site(identifier: String) -> CliError {
    CliError::NotFound {
        resource_type: "site".into(),
        identifier,
        list_command: "sites list".into(),
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SiteNotFound { identifier } => not_found_site(identifier),

            CoreError::SiteLookupFailed { identifier, source } => CliError::LookupFailed {
                identifier,
                source: Box::new(CliError::from(*source)),
            },

            CoreError::InvalidInput { message } => CliError::InvalidInput { message },

            CoreError::Io { path, source } => CliError::ReadInput { path, source },

            err @ CoreError::AssignmentFailed { .. } => CliError::ApiError {
                status: None,
                message: err.to_string(),
            },

            err @ CoreError::Cancelled { .. } => CliError::Cancelled(err.to_string()),

            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}
