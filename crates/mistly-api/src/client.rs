// Hand-crafted async HTTP client for the organization inventory API.
//
// Base path: /api/v1/
// Auth: `Authorization: Token <token>` header

use std::future::Future;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types;

/// Page size used by the list helpers.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the inventory REST API.
///
/// Every path is relative to `{base}/api/v1/`. The client holds no
/// organization state; callers pass the org ID on each call.
pub struct MistClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MistClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API token and transport config.
    ///
    /// Injects `Authorization: Token ...` as a default header on every request.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid API token header value: {e}"),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Build the base URL ending in `/api/v1/`.
    ///
    /// Accepts both the bare host (`https://api.mist.com`) and a URL that
    /// already carries the API prefix.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/v1/"));
        }

        Ok(url)
    }

    /// The normalized API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidToken;
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Error::RateLimited { retry_after_secs };
        }

        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => err
                .detail
                .or(err.message)
                .unwrap_or_else(|| status.to_string()),
            Err(_) if raw.is_empty() => status.to_string(),
            Err(_) => raw,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect all pages into a single `Vec<T>`.
    ///
    /// Pages are 1-based; iteration stops at the first short page.
    pub async fn paginate_all<T, F, Fut>(&self, limit: u32, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
    {
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let batch = fetch(page, limit).await?;
            let received = batch.len();
            all.extend(batch);

            if received < usize::try_from(limit).unwrap_or(usize::MAX) || received == 0 {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Sites ────────────────────────────────────────────────────────

    /// `GET /sites/{site_id}`
    pub async fn get_site(&self, site_id: &str) -> Result<types::SiteResponse, Error> {
        self.get(&format!("sites/{site_id}")).await
    }

    /// `GET /orgs/{org_id}/sites/search?name=...`
    pub async fn search_sites_by_name(
        &self,
        org_id: &str,
        name: &str,
    ) -> Result<types::SearchResponse<types::SiteResponse>, Error> {
        self.get_with_params(
            &format!("orgs/{org_id}/sites/search"),
            &[("name", name.to_owned())],
        )
        .await
    }

    /// `GET /orgs/{org_id}/sites` (one page)
    pub async fn list_sites(
        &self,
        org_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<types::SiteResponse>, Error> {
        self.get_with_params(
            &format!("orgs/{org_id}/sites"),
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    // ── Inventory ────────────────────────────────────────────────────

    /// `GET /orgs/{org_id}/inventory` (one page), optionally filtered by type.
    pub async fn list_inventory(
        &self,
        org_id: &str,
        device_type: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<types::InventoryResponse>, Error> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(t) = device_type {
            params.push(("type", t.to_owned()));
        }
        self.get_with_params(&format!("orgs/{org_id}/inventory"), &params)
            .await
    }

    /// Assign a batch of devices to a site in one call.
    ///
    /// `PUT /orgs/{org_id}/inventory` with `{"op": "assign", ...}`
    pub async fn assign_inventory(
        &self,
        org_id: &str,
        site_id: &str,
        macs: &[String],
    ) -> Result<types::InventoryOpResponse, Error> {
        debug!(org_id, site_id, count = macs.len(), "assigning inventory");
        self.put(
            &format!("orgs/{org_id}/inventory"),
            &types::InventoryOpRequest {
                op: "assign",
                site_id: Some(site_id),
                macs,
                no_reassign: false,
            },
        )
        .await
    }
}
