//! Configuration for the mistly CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `mistly_core::{ConnectionConfig, AssignConfig}`.
//! The CLI layers its `GlobalOpts` overrides on top of this.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mistly_core::{AssignConfig, ConnectionConfig, NameMatch, TlsVerification};

/// Hosted API endpoint used when a profile does not name one.
pub const DEFAULT_API_URL: &str = "https://api.mist.com";

/// Keyring service name for stored API tokens.
const KEYRING_SERVICE: &str = "mistly";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named organization profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named organization profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// API host (defaults to the hosted cloud).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Organization that owns the inventory.
    pub org_id: Option<String>,

    /// API token (plaintext, prefer keyring or env var).
    pub api_token: Option<String>,

    /// Environment variable name containing the API token.
    pub api_token_env: Option<String>,

    /// Compare free-text site names case-insensitively.
    #[serde(default)]
    pub case_insensitive_names: bool,

    /// Sites processed at once in CSV runs.
    pub max_concurrent_sites: Option<usize>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            org_id: None,
            api_token: None,
            api_token_env: None,
            case_insensitive_names: false,
            max_concurrent_sites: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path.
///
/// `MISTLY_CONFIG` wins; otherwise XDG / platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("MISTLY_CONFIG") {
        return PathBuf::from(explicit);
    }
    ProjectDirs::from("com", "mistly", "mistly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mistly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MISTLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

// ── Credentials ─────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-token"))
}

/// Resolve an API token from the credential chain (no CLI flag step).
pub fn resolve_api_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_token_env -> env var lookup
    if let Some(ref env_name) = profile.api_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.api_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API token for `profile_name` in the system keyring.
pub fn store_api_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Parse and validate a profile's API URL.
pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// The connection half of a profile, given an already resolved token.
pub fn connection_config(
    profile: &Profile,
    token: SecretString,
) -> Result<ConnectionConfig, ConfigError> {
    let url = parse_api_url(&profile.api_url)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ConnectionConfig {
        url,
        token,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
    })
}

/// The bulk-run half of a profile.
pub fn assign_config(profile: &Profile, profile_name: &str) -> Result<AssignConfig, ConfigError> {
    let org_id = profile
        .org_id
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .ok_or_else(|| ConfigError::Validation {
            field: "org_id".into(),
            reason: format!("profile '{profile_name}' has no organization ID"),
        })?;

    let max_concurrent_sites = profile.max_concurrent_sites.unwrap_or(1);
    if max_concurrent_sites == 0 {
        return Err(ConfigError::Validation {
            field: "max_concurrent_sites".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut config = AssignConfig::new(org_id);
    config.name_match = if profile.case_insensitive_names {
        NameMatch::CaseInsensitive
    } else {
        NameMatch::Exact
    };
    config.max_concurrent_sites = max_concurrent_sites;
    Ok(config)
}

/// Build both core configs from a profile, without CLI flag overrides.
pub fn profile_to_configs(
    profile: &Profile,
    profile_name: &str,
) -> Result<(ConnectionConfig, AssignConfig), ConfigError> {
    let assign = assign_config(profile, profile_name)?;
    let token = resolve_api_token(profile, profile_name)?;
    let connection = connection_config(profile, token)?;
    Ok((connection, assign))
}
