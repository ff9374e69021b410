// ── Inventory device types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumString;

use super::ids::{DeviceMac, SiteId};

/// The kind of a claimed device. Closed set: every match is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    #[serde(rename = "ap")]
    #[strum(serialize = "ap")]
    AccessPoint,
    Switch,
    Gateway,
}

impl DeviceKind {
    /// The `type` value used by the inventory API.
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::AccessPoint => "ap",
            Self::Switch => "switch",
            Self::Gateway => "gateway",
        }
    }

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::AccessPoint => "AP",
            Self::Switch => "Switch",
            Self::Gateway => "Gateway",
        }
    }
}

/// A device claimed into the organization inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDevice {
    pub kind: DeviceKind,
    pub mac: DeviceMac,
    pub serial: Option<String>,
    pub model: Option<String>,
    pub name: Option<String>,
    /// `None` while the device is unassigned.
    pub site_id: Option<SiteId>,
    pub connected: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl InventoryDevice {
    pub fn is_assigned(&self) -> bool {
        self.site_id.is_some()
    }
}
