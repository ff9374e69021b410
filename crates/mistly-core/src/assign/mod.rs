// ── Bulk assignment orchestration ──
//
// Parses an input source into requests, resolves each distinct site once,
// issues one batch assignment call per site, and folds every outcome into a
// `ResultAggregator`. A batch fails or succeeds as a whole; its error is
// shared (not copied) by every request in the batch. Different spellings of
// one site form separate groups, so batches are serialized per resolved
// `SiteId` rather than per group.

pub mod report;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::AssignConfig;
use crate::error::CoreError;
use crate::input::{self, AssignmentRequest, SiteGroup};
use crate::inventory::Inventory;
use crate::model::{DeviceMac, SiteId};
use crate::resolve::IdentifierResolver;

use self::report::{
    AssignmentMode, AssignmentOutcome, BatchState, BulkAssignmentReport, ResultAggregator,
    SharedError,
};

/// Where the MACs (and their target sites) come from.
#[derive(Debug, Clone)]
pub enum AssignmentSource {
    /// MACs given on the command line, all for one site.
    Inline { macs: Vec<String>, site: String },
    /// Newline-delimited MAC file, all for one site.
    MacFile { path: PathBuf, site: String },
    /// `MAC,SiteName` lines; each line names its own site.
    CsvFile { path: PathBuf },
}

impl AssignmentSource {
    pub fn mode(&self) -> AssignmentMode {
        match self {
            Self::Inline { .. } | Self::MacFile { .. } => AssignmentMode::SingleSite,
            Self::CsvFile { .. } => AssignmentMode::MultiSite,
        }
    }
}

/// Drives a bulk run against an [`Inventory`].
pub struct BulkAssigner<I> {
    inventory: Arc<I>,
    config: AssignConfig,
}

impl<I: Inventory> BulkAssigner<I> {
    pub fn new(inventory: Arc<I>, config: AssignConfig) -> Self {
        Self { inventory, config }
    }

    pub fn resolver(&self) -> IdentifierResolver<'_, I> {
        IdentifierResolver::new(self.inventory.as_ref(), &self.config)
    }

    /// Run a bulk assignment.
    ///
    /// Parse errors are fatal and abort before any remote call. In
    /// single-site mode a resolution failure is returned as `Err`; in
    /// multi-site mode it is recorded against that site's requests and the
    /// run continues. Once `cancel` fires, no further site is resolved or
    /// dispatched and the remaining requests are recorded as cancelled. A
    /// single-site run cancelled before its batch is sent returns
    /// `Err(Cancelled)` instead of a report.
    pub async fn bulk_assign(
        &self,
        source: AssignmentSource,
        cancel: &CancellationToken,
    ) -> Result<BulkAssignmentReport, CoreError> {
        match source {
            AssignmentSource::Inline { macs, site } => {
                let parsed = input::parse_inline_macs(macs.as_slice())?;
                let originals = macs
                    .iter()
                    .map(|m| m.trim())
                    .filter(|m| !m.is_empty())
                    .map(str::to_owned)
                    .collect();
                self.assign_single(site, parsed, originals, cancel).await
            }
            AssignmentSource::MacFile { path, site } => {
                let content = input::read_input_file(&path)?;
                let parsed = input::parse_mac_list(&content, &path)?;
                let originals = trimmed_lines(&content);
                self.assign_single(site, parsed, originals, cancel).await
            }
            AssignmentSource::CsvFile { path } => self.assign_multi(&path, cancel).await,
        }
    }

    // ── Single-site mode ────────────────────────────────────────────

    async fn assign_single(
        &self,
        site: String,
        macs: Vec<DeviceMac>,
        original_macs: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<BulkAssignmentReport, CoreError> {
        let site = site.trim().to_owned();
        if site.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "site identifier must not be empty".into(),
            });
        }

        let aggregator = ResultAggregator::new(AssignmentMode::SingleSite);
        info!(site = %site, total = macs.len(), "starting single-site assignment");

        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled { site });
        }
        let site_id = self.resolver().resolve(&site).await?;
        if cancel.is_cancelled() {
            debug!(site = %site, "cancelled after resolution, nothing dispatched");
            return Err(CoreError::Cancelled { site });
        }

        let requests = macs
            .into_iter()
            .enumerate()
            .map(|(i, mac)| AssignmentRequest {
                index: i + 1,
                mac,
                site: site.clone(),
            })
            .collect();
        let group = SiteGroup {
            site,
            requests,
            original_macs,
        };

        let (state, outcomes) = self.dispatch(&group, site_id, cancel).await;
        debug!(site = %group.site, ?state, "single-site batch settled");
        for outcome in outcomes {
            aggregator.record(outcome);
        }

        let report = aggregator.finish();
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "single-site assignment finished"
        );
        Ok(report)
    }

    // ── Multi-site mode ─────────────────────────────────────────────

    async fn assign_multi(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<BulkAssignmentReport, CoreError> {
        let content = input::read_input_file(path)?;
        let parsed = input::parse_mac_site_csv(&content, path)?;
        let limit = self.config.max_concurrent_sites.max(1);
        info!(
            total = parsed.total,
            sites = parsed.groups.len(),
            concurrency = limit,
            "starting multi-site assignment"
        );

        let aggregator = ResultAggregator::new(AssignmentMode::MultiSite);
        let locks = SiteLocks::default();
        stream::iter(parsed.groups.into_iter().enumerate())
            .map(|(order, group)| self.process_site(order, group, &aggregator, &locks, cancel))
            .buffer_unordered(limit)
            .collect::<Vec<()>>()
            .await;

        let report = aggregator.finish();
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            sites = report.sites.len(),
            "multi-site assignment finished"
        );
        Ok(report)
    }

    /// Resolve one site group and dispatch its batch, recording every outcome.
    async fn process_site(
        &self,
        order: usize,
        group: SiteGroup,
        aggregator: &ResultAggregator,
        locks: &SiteLocks,
        cancel: &CancellationToken,
    ) {
        if cancel.is_cancelled() {
            debug!(site = %group.site, "skipping site after cancellation");
            let error = Arc::new(CoreError::Cancelled {
                site: group.site.clone(),
            });
            let outcomes = fail_all(&group, None, &error);
            aggregator.record_site(order, &group.site, None, BatchState::Failed, outcomes);
            return;
        }

        match self.resolver().resolve(&group.site).await {
            Ok(site_id) => {
                let lock = locks.for_site(&site_id);
                let _in_flight = lock.lock().await;
                let (state, outcomes) = self.dispatch(&group, site_id.clone(), cancel).await;
                aggregator.record_site(order, &group.site, Some(site_id), state, outcomes);
            }
            Err(e) => {
                warn!(site = %group.site, error = %e, "site resolution failed");
                let outcomes = fail_all(&group, None, &Arc::new(e));
                aggregator.record_site(order, &group.site, None, BatchState::Failed, outcomes);
            }
        }
    }

    /// Send one batch for an already resolved site.
    async fn dispatch(
        &self,
        group: &SiteGroup,
        site_id: SiteId,
        cancel: &CancellationToken,
    ) -> (BatchState, Vec<AssignmentOutcome>) {
        let state = transition(&group.site, BatchState::Pending, BatchState::Resolved);

        if cancel.is_cancelled() {
            debug!(site = %group.site, "batch not dispatched after cancellation");
            let error = Arc::new(CoreError::Cancelled {
                site: group.site.clone(),
            });
            let state = transition(&group.site, state, BatchState::Failed);
            return (state, fail_all(group, Some(&site_id), &error));
        }

        let state = transition(&group.site, state, BatchState::Dispatched);
        let macs: Vec<DeviceMac> = group.requests.iter().map(|r| r.mac.clone()).collect();
        debug!(site = %group.site, site_id = %site_id, devices = macs.len(), "dispatching batch");

        match self
            .inventory
            .assign_devices(&self.config.org_id, &site_id, &macs)
            .await
        {
            Ok(()) => {
                let state = transition(&group.site, state, BatchState::Succeeded);
                let outcomes = group
                    .requests
                    .iter()
                    .zip(&group.original_macs)
                    .map(|(req, original)| {
                        AssignmentOutcome::succeeded(req.clone(), original.clone(), site_id.clone())
                    })
                    .collect();
                (state, outcomes)
            }
            Err(e) => {
                warn!(site = %group.site, error = %e, "batch assignment failed");
                let error = Arc::new(CoreError::AssignmentFailed {
                    site: group.site.clone(),
                    source: Box::new(e),
                });
                let state = transition(&group.site, state, BatchState::Failed);
                (state, fail_all(group, Some(&site_id), &error))
            }
        }
    }
}

/// One async lock per resolved site; held while that site's batch is in flight.
#[derive(Default)]
struct SiteLocks(Mutex<HashMap<SiteId, Arc<AsyncMutex<()>>>>);

impl SiteLocks {
    fn for_site(&self, id: &SiteId) -> Arc<AsyncMutex<()>> {
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(id.clone()).or_default())
    }
}

fn transition(site: &str, from: BatchState, to: BatchState) -> BatchState {
    trace!(site, ?from, ?to, "batch state");
    from.advance(to).unwrap_or(BatchState::Failed)
}

fn fail_all(
    group: &SiteGroup,
    site_id: Option<&SiteId>,
    error: &SharedError,
) -> Vec<AssignmentOutcome> {
    group
        .requests
        .iter()
        .zip(&group.original_macs)
        .map(|(req, original)| {
            AssignmentOutcome::failed(
                req.clone(),
                original.clone(),
                site_id.cloned(),
                Arc::clone(error),
            )
        })
        .collect()
}

fn trimmed_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}
