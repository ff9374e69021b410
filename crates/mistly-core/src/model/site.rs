// ── Site domain type ──

use serde::{Deserialize, Serialize};

use super::ids::{OrgId, SiteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    /// Human-friendly name. Site codes (`US-NYC-HQ01`) are stored here too.
    pub name: String,
    pub org_id: OrgId,
    pub country_code: Option<String>,
    pub timezone: Option<String>,
    pub address: Option<String>,
}
