// ── Inventory seam ──
//
// The `Inventory` trait is the only way the core talks to the remote
// inventory. `ApiInventory` implements it over `MistClient`; tests use
// in-memory fakes.

use std::future::Future;

use tracing::debug;

use mistly_api::client::DEFAULT_PAGE_LIMIT;
use mistly_api::{MistClient, TlsMode, TransportConfig};

use crate::config::{ConnectionConfig, NameMatch, TlsVerification};
use crate::error::CoreError;
use crate::model::{DeviceKind, DeviceMac, InventoryDevice, OrgId, Site, SiteId};

/// Operations the core needs from the remote inventory.
///
/// Every method is a single request/response exchange as far as the caller
/// is concerned. Lookups return `Ok(None)` for a miss; `Err` is reserved for
/// failures to ask the question at all.
pub trait Inventory: Send + Sync {
    /// Look up a site by its canonical ID.
    fn site_by_id(&self, id: &str) -> impl Future<Output = Result<Option<Site>, CoreError>> + Send;

    /// Look up a site of `org` by name.
    fn site_by_name(
        &self,
        org: &OrgId,
        name: &str,
        matching: NameMatch,
    ) -> impl Future<Output = Result<Option<Site>, CoreError>> + Send;

    /// Assign a batch of devices to a site in one call.
    ///
    /// The call succeeds or fails as a whole; there is no per-device status.
    fn assign_devices(
        &self,
        org: &OrgId,
        site: &SiteId,
        macs: &[DeviceMac],
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// List every site of `org`.
    fn list_sites(&self, org: &OrgId) -> impl Future<Output = Result<Vec<Site>, CoreError>> + Send;

    /// List claimed devices of `org`, optionally restricted to one kind.
    fn list_devices(
        &self,
        org: &OrgId,
        kind: Option<DeviceKind>,
    ) -> impl Future<Output = Result<Vec<InventoryDevice>, CoreError>> + Send;
}

// ── HTTP-backed implementation ──────────────────────────────────────

/// [`Inventory`] over the REST API.
pub struct ApiInventory {
    client: MistClient,
}

impl ApiInventory {
    pub fn new(client: MistClient) -> Self {
        Self { client }
    }

    /// Build the HTTP client from a [`ConnectionConfig`].
    pub fn connect(config: &ConnectionConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
        };
        let client = MistClient::from_token(config.url.as_str(), &config.token, &transport)?;
        debug!(base_url = %client.base_url(), "inventory client ready");
        Ok(Self::new(client))
    }
}

impl Inventory for ApiInventory {
    async fn site_by_id(&self, id: &str) -> Result<Option<Site>, CoreError> {
        match self.client.get_site(id).await {
            Ok(site) => Ok(Some(site.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn site_by_name(
        &self,
        org: &OrgId,
        name: &str,
        matching: NameMatch,
    ) -> Result<Option<Site>, CoreError> {
        // The search endpoint compares names exactly, so a case-insensitive
        // match has to look at the full site list instead.
        let candidates = match matching {
            NameMatch::Exact => {
                self.client
                    .search_sites_by_name(org.as_str(), name)
                    .await?
                    .results
            }
            NameMatch::CaseInsensitive => {
                self.client
                    .paginate_all(DEFAULT_PAGE_LIMIT, |page, limit| {
                        self.client.list_sites(org.as_str(), page, limit)
                    })
                    .await?
            }
        };
        debug!(name, ?matching, candidates = candidates.len(), "site name lookup");

        Ok(candidates
            .into_iter()
            .find(|s| matching.matches(&s.name, name))
            .map(Site::from))
    }

    async fn assign_devices(
        &self,
        org: &OrgId,
        site: &SiteId,
        macs: &[DeviceMac],
    ) -> Result<(), CoreError> {
        let macs: Vec<String> = macs.iter().map(|m| m.as_str().to_owned()).collect();
        let resp = self
            .client
            .assign_inventory(org.as_str(), site.as_str(), &macs)
            .await?;
        debug!(
            site = %site,
            sent = macs.len(),
            echoed = resp.success.len(),
            "assign call accepted"
        );
        Ok(())
    }

    async fn list_sites(&self, org: &OrgId) -> Result<Vec<Site>, CoreError> {
        let sites = self
            .client
            .paginate_all(DEFAULT_PAGE_LIMIT, |page, limit| {
                self.client.list_sites(org.as_str(), page, limit)
            })
            .await?;
        Ok(sites.into_iter().map(Site::from).collect())
    }

    async fn list_devices(
        &self,
        org: &OrgId,
        kind: Option<DeviceKind>,
    ) -> Result<Vec<InventoryDevice>, CoreError> {
        let type_filter = kind.map(DeviceKind::as_api_str);
        let raw = self
            .client
            .paginate_all(DEFAULT_PAGE_LIMIT, |page, limit| {
                self.client
                    .list_inventory(org.as_str(), type_filter, page, limit)
            })
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|d| match InventoryDevice::try_from(d) {
                Ok(device) => Some(device),
                Err(unsupported) => {
                    debug!(device_type = %unsupported.0, "skipping unsupported inventory entry");
                    None
                }
            })
            .collect())
    }
}
