// ── Runtime configuration ──
//
// These types describe how to reach the inventory API and how bulk runs
// behave. They never touch disk: the CLI builds them (via mistly-config)
// and hands them in at construction time.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::model::OrgId;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default for the hosted API.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

/// How to connect to the inventory API.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// API host (e.g., `https://api.mist.com`).
    pub url: Url,
    /// API token.
    pub token: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

/// How free-text site names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameMatch {
    #[default]
    Exact,
    CaseInsensitive,
}

impl NameMatch {
    pub fn matches(self, candidate: &str, wanted: &str) -> bool {
        match self {
            Self::Exact => candidate == wanted,
            Self::CaseInsensitive => candidate.to_lowercase() == wanted.to_lowercase(),
        }
    }
}

/// Settings for identifier resolution and bulk assignment.
#[derive(Debug, Clone)]
pub struct AssignConfig {
    /// Organization that owns the inventory and the sites.
    pub org_id: OrgId,
    /// Name comparison for the free-text fallback.
    pub name_match: NameMatch,
    /// Maximum number of sites processed at once in CSV runs. 1 = sequential.
    pub max_concurrent_sites: usize,
}

impl AssignConfig {
    pub fn new(org_id: impl Into<OrgId>) -> Self {
        Self {
            org_id: org_id.into(),
            name_match: NameMatch::default(),
            max_concurrent_sites: 1,
        }
    }
}
