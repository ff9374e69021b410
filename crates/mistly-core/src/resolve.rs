// ── Identifier resolution ──
//
// Turns a raw, user-supplied site identifier into the canonical site ID the
// inventory API requires. Classification rules are tried in a fixed order and
// the first match wins; a string is never re-classified by a later rule.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::{AssignConfig, NameMatch};
use crate::error::CoreError;
use crate::inventory::Inventory;
use crate::model::{Site, SiteId};

/// How a raw identifier was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Hyphenated UUID or synthetic `site-<n>` ID; looked up directly.
    CanonicalId,
    /// Short structured code (`US-NYC-HQ01`); looked up by upper-cased name.
    SiteCode,
    /// Anything else; looked up by name.
    Name,
}

impl IdentifierKind {
    pub fn classify(raw: &str) -> Self {
        if canonical_form(raw).is_some() {
            Self::CanonicalId
        } else if is_site_code(raw) {
            Self::SiteCode
        } else {
            Self::Name
        }
    }
}

/// The lookup key for a canonical ID, or `None` if `raw` is not one.
///
/// UUIDs are lower-cased so every spelling maps to the same key.
fn canonical_form(raw: &str) -> Option<String> {
    if raw.len() == 36 {
        if let Ok(uuid) = Uuid::parse_str(raw) {
            return Some(uuid.to_string());
        }
    }
    is_synthetic_id(raw).then(|| raw.to_owned())
}

/// Synthetic IDs used by test fixtures: `site-` followed by digits.
fn is_synthetic_id(raw: &str) -> bool {
    raw.strip_prefix("site-")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Whole-string match of `\w{2}-\w{3,4}-\w{1,10}` (ASCII word characters).
fn is_site_code(raw: &str) -> bool {
    fn word(part: &str, len: std::ops::RangeInclusive<usize>) -> bool {
        len.contains(&part.len())
            && part
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }

    let mut parts = raw.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) => word(a, 2..=2) && word(b, 3..=4) && word(c, 1..=10),
        _ => false,
    }
}

/// A successful resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSite {
    pub kind: IdentifierKind,
    /// The value actually sent to the inventory.
    pub lookup: String,
    pub site: Site,
}

/// Resolves raw identifiers against an [`Inventory`].
///
/// Performs exactly one inventory round trip per call and keeps no cache;
/// callers that see the same identifier repeatedly dedupe themselves.
pub struct IdentifierResolver<'a, I> {
    inventory: &'a I,
    config: &'a AssignConfig,
}

impl<'a, I: Inventory> IdentifierResolver<'a, I> {
    pub fn new(inventory: &'a I, config: &'a AssignConfig) -> Self {
        Self { inventory, config }
    }

    /// Resolve `raw` to its canonical site ID.
    pub async fn resolve(&self, raw: &str) -> Result<SiteId, CoreError> {
        self.resolve_site(raw).await.map(|r| r.site.id)
    }

    /// Resolve `raw` and keep the classification and the full site record.
    pub async fn resolve_site(&self, raw: &str) -> Result<ResolvedSite, CoreError> {
        let kind = IdentifierKind::classify(raw);

        let (lookup, reported, found) = match kind {
            IdentifierKind::CanonicalId => {
                let key = canonical_form(raw).unwrap_or_else(|| raw.to_owned());
                let found = self.inventory.site_by_id(&key).await;
                (key, raw.to_owned(), found)
            }
            IdentifierKind::SiteCode => {
                let code = raw.to_uppercase();
                let found = self
                    .inventory
                    .site_by_name(&self.config.org_id, &code, NameMatch::Exact)
                    .await;
                (code.clone(), code, found)
            }
            IdentifierKind::Name => {
                let found = self
                    .inventory
                    .site_by_name(&self.config.org_id, raw, self.config.name_match)
                    .await;
                (raw.to_owned(), raw.to_owned(), found)
            }
        };
        debug!(identifier = raw, ?kind, lookup = %lookup, "resolving site");

        match found {
            Ok(Some(site)) => Ok(ResolvedSite { kind, lookup, site }),
            Ok(None) => Err(CoreError::SiteNotFound {
                identifier: reported,
            }),
            Err(e) => Err(CoreError::SiteLookupFailed {
                identifier: reported,
                source: Box::new(e),
            }),
        }
    }
}
