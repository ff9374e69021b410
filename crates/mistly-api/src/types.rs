//! Response and request types for the inventory API (`/api/v1/`).
//!
//! Field names follow the API's snake_case JSON. Unknown fields are ignored
//! unless captured by an `extra` map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Sites ────────────────────────────────────────────────────────────

/// Site object -- from `GET /sites/{id}` and the org site listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteResponse {
    pub id: String,
    pub name: String,
    pub org_id: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Catch-all for fields not modeled above.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Envelope returned by the `.../search` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: Option<u32>,
}

// ── Inventory ────────────────────────────────────────────────────────

/// Inventory entry -- from `GET /orgs/{org_id}/inventory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryResponse {
    pub mac: String,
    /// One of `ap`, `switch`, `gateway`.
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub connected: bool,
    /// Epoch seconds.
    #[serde(default)]
    pub created_time: Option<i64>,
    /// Epoch seconds.
    #[serde(default)]
    pub modified_time: Option<i64>,
}

/// Body for `PUT /orgs/{org_id}/inventory`.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryOpRequest<'a> {
    pub op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<&'a str>,
    pub macs: &'a [String],
    pub no_reassign: bool,
}

/// Response of an inventory operation.
///
/// The API echoes per-MAC lists, but callers treat the operation as a
/// single batch result and only look at the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryOpResponse {
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub success: Vec<String>,
    #[serde(default)]
    pub error: Vec<String>,
    #[serde(default)]
    pub reason: Vec<String>,
}
