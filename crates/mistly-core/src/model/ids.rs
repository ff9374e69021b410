// ── Identity types ──
//
// Thin newtypes so organization IDs, canonical site IDs and device MACs
// cannot be mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── OrgId ───────────────────────────────────────────────────────────

/// Organization identifier, taken verbatim from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrgId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrgId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── SiteId ──────────────────────────────────────────────────────────

/// Canonical site identifier as issued by the inventory.
///
/// Only produced from inventory responses, never from user input:
/// `new` exists for [`Inventory`](crate::Inventory) implementations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── DeviceMac ───────────────────────────────────────────────────────

/// Device MAC address as supplied by the user.
///
/// Normalization only strips whitespace (leading, trailing and internal).
/// Separators and hex-digit case are kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMac(String);

impl DeviceMac {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().chars().filter(|c| !c.is_whitespace()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DeviceMac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
