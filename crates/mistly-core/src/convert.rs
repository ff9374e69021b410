// ── API-to-domain type conversions ──
//
// Bridges raw `mistly_api::types` responses into canonical domain types.

use chrono::{DateTime, Utc};

use mistly_api::types::{InventoryResponse, SiteResponse};

use crate::model::{DeviceKind, DeviceMac, InventoryDevice, OrgId, Site, SiteId};

/// Convert an optional epoch-seconds timestamp to `DateTime<Utc>`.
fn epoch_to_datetime(epoch: Option<i64>) -> Option<DateTime<Utc>> {
    epoch.and_then(|ts| DateTime::from_timestamp(ts, 0))
}

/// Treat empty strings the API sometimes sends as absent.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

impl From<SiteResponse> for Site {
    fn from(s: SiteResponse) -> Self {
        Self {
            id: SiteId::new(s.id),
            name: s.name,
            org_id: OrgId::from(s.org_id),
            country_code: non_empty(s.country_code),
            timezone: non_empty(s.timezone),
            address: non_empty(s.address),
        }
    }
}

/// An inventory entry whose `type` is not one of the supported kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedDeviceType(pub String);

impl TryFrom<InventoryResponse> for InventoryDevice {
    type Error = UnsupportedDeviceType;

    fn try_from(d: InventoryResponse) -> Result<Self, Self::Error> {
        let kind: DeviceKind = d
            .device_type
            .parse()
            .map_err(|_| UnsupportedDeviceType(d.device_type.clone()))?;

        Ok(Self {
            kind,
            mac: DeviceMac::new(&d.mac),
            serial: non_empty(d.serial),
            model: non_empty(d.model),
            name: non_empty(d.name),
            site_id: non_empty(d.site_id).map(SiteId::new),
            connected: d.connected,
            created_at: epoch_to_datetime(d.created_time),
            modified_at: epoch_to_datetime(d.modified_time),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn inventory(device_type: &str) -> InventoryResponse {
        InventoryResponse {
            mac: "5c5b35000001".into(),
            device_type: device_type.into(),
            serial: Some("FXLH2015150025".into()),
            model: Some("AP43".into()),
            name: Some(String::new()),
            site_id: Some("4ac1dcf4-9d8b-7211-65c4-057819f0862b".into()),
            connected: true,
            created_time: Some(1_700_000_000),
            modified_time: None,
        }
    }

    #[test]
    fn inventory_entry_converts() {
        let device = InventoryDevice::try_from(inventory("ap")).unwrap();
        assert_eq!(device.kind, DeviceKind::AccessPoint);
        assert_eq!(device.mac.as_str(), "5c5b35000001");
        assert!(device.name.is_none(), "empty name should be dropped");
        assert!(device.is_assigned());
        assert_eq!(device.created_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn unknown_device_type_is_rejected() {
        let err = InventoryDevice::try_from(inventory("mxedge")).unwrap_err();
        assert_eq!(err, UnsupportedDeviceType("mxedge".into()));
    }

    #[test]
    fn site_converts() {
        let site = Site::from(SiteResponse {
            id: "s-1".into(),
            name: "HQ".into(),
            org_id: "org-1".into(),
            timezone: Some("Europe/Berlin".into()),
            country_code: Some(String::new()),
            address: None,
            extra: std::collections::HashMap::new(),
        });
        assert_eq!(site.id.as_str(), "s-1");
        assert_eq!(site.org_id.as_str(), "org-1");
        assert!(site.country_code.is_none());
    }
}
