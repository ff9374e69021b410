// ── Outcome aggregation and the final report ──
//
// Every `AssignmentRequest` yields exactly one `AssignmentOutcome`. The
// aggregator accepts outcomes in any completion order (it is shared across
// concurrently processed sites) and the report always lists them by
// original input index.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::input::AssignmentRequest;
use crate::model::SiteId;

/// An error shared by every item of the batch it failed.
pub type SharedError = Arc<CoreError>;

fn serialize_error<S: Serializer>(err: &SharedError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&err.to_string())
}

fn serialize_duration<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_elapsed(*d))
}

/// Render a duration at millisecond precision, e.g. `1s 234ms`.
pub fn format_elapsed(d: Duration) -> String {
    let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
    humantime::format_duration(Duration::from_millis(millis)).to_string()
}

// ── Outcomes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// One target site (inline MACs or a MAC-list file).
    SingleSite,
    /// Targets read per line from a CSV file.
    MultiSite,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed {
        #[serde(serialize_with = "serialize_error")]
        error: SharedError,
    },
}

/// Terminal result for one request.
///
/// Built only through [`succeeded`](Self::succeeded) (which requires a
/// resolved site) and [`failed`](Self::failed).
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    request: AssignmentRequest,
    /// MAC as the user wrote it.
    original_mac: String,
    site_id: Option<SiteId>,
    #[serde(flatten)]
    status: OutcomeStatus,
}

impl AssignmentOutcome {
    pub fn succeeded(request: AssignmentRequest, original_mac: String, site_id: SiteId) -> Self {
        Self {
            request,
            original_mac,
            site_id: Some(site_id),
            status: OutcomeStatus::Succeeded,
        }
    }

    pub fn failed(
        request: AssignmentRequest,
        original_mac: String,
        site_id: Option<SiteId>,
        error: SharedError,
    ) -> Self {
        Self {
            request,
            original_mac,
            site_id,
            status: OutcomeStatus::Failed { error },
        }
    }

    pub fn request(&self) -> &AssignmentRequest {
        &self.request
    }

    pub fn original_mac(&self) -> &str {
        &self.original_mac
    }

    pub fn site_id(&self) -> Option<&SiteId> {
        self.site_id.as_ref()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }

    pub fn error(&self) -> Option<&SharedError> {
        match &self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Failed { error } => Some(error),
        }
    }
}

// ── Per-site state ──────────────────────────────────────────────────

/// Lifecycle of a site batch (and of every request in it).
///
/// `Pending -> Resolved -> Dispatched -> {Succeeded, Failed}`, or
/// `Pending -> Failed` when resolution fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Pending,
    Resolved,
    Dispatched,
    Succeeded,
    Failed,
}

impl BatchState {
    /// Move to `next`, refusing transitions the lifecycle does not allow.
    pub fn advance(self, next: BatchState) -> Option<BatchState> {
        let allowed = matches!(
            (self, next),
            (Self::Pending, Self::Resolved | Self::Failed)
                | (Self::Resolved, Self::Dispatched | Self::Failed)
                | (Self::Dispatched, Self::Succeeded | Self::Failed)
        );
        allowed.then_some(next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Sub-aggregate for one target site in a multi-site run.
#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    /// Position in the grouping order.
    #[serde(skip)]
    pub order: usize,
    /// Raw identifier from the input.
    pub site: String,
    pub site_id: Option<SiteId>,
    pub state: BatchState,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

// ── Aggregator ──────────────────────────────────────────────────────

#[derive(Default)]
struct Tally {
    attempted: usize,
    succeeded: usize,
    failed: usize,
    outcomes: Vec<AssignmentOutcome>,
    sites: Vec<SiteSummary>,
}

/// Running counters plus a stopwatch. Safe to share between tasks.
pub struct ResultAggregator {
    mode: AssignmentMode,
    started: Instant,
    tally: Mutex<Tally>,
}

impl ResultAggregator {
    /// Start the stopwatch.
    pub fn new(mode: AssignmentMode) -> Self {
        Self {
            mode,
            started: Instant::now(),
            tally: Mutex::new(Tally::default()),
        }
    }

    /// Record the terminal outcome of one request.
    pub fn record(&self, outcome: AssignmentOutcome) {
        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        tally.attempted += 1;
        if outcome.is_success() {
            tally.succeeded += 1;
        } else {
            tally.failed += 1;
        }
        tally.outcomes.push(outcome);
    }

    /// Record every outcome of a site batch together with its sub-aggregate.
    pub fn record_site(
        &self,
        order: usize,
        site: &str,
        site_id: Option<SiteId>,
        state: BatchState,
        outcomes: Vec<AssignmentOutcome>,
    ) {
        let total = outcomes.len();
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        for outcome in outcomes {
            self.record(outcome);
        }

        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        tally.sites.push(SiteSummary {
            order,
            site: site.to_owned(),
            site_id,
            state,
            total,
            succeeded,
            failed: total - succeeded,
        });
    }

    /// Stop the stopwatch and build the report.
    pub fn finish(self) -> BulkAssignmentReport {
        let elapsed = self.started.elapsed();
        let mut tally = self
            .tally
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        tally.outcomes.sort_by_key(|o| o.request.index);
        tally.sites.sort_by_key(|s| s.order);

        BulkAssignmentReport {
            mode: self.mode,
            total: tally.attempted,
            succeeded: tally.succeeded,
            failed: tally.failed,
            elapsed,
            outcomes: tally.outcomes,
            sites: tally.sites,
        }
    }
}

// ── Report ──────────────────────────────────────────────────────────

/// Final result of a bulk run. `succeeded + failed == total` always holds.
#[derive(Debug, Clone, Serialize)]
pub struct BulkAssignmentReport {
    pub mode: AssignmentMode,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
    /// Ordered by original input index.
    pub outcomes: Vec<AssignmentOutcome>,
    /// Multi-site runs only, in grouping order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sites: Vec<SiteSummary>,
}

impl BulkAssignmentReport {
    pub fn failures(&self) -> impl Iterator<Item = &AssignmentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// The error of the lowest-indexed failed item.
    pub fn first_error(&self) -> Option<&SharedError> {
        self.failures().find_map(AssignmentOutcome::error)
    }

    /// Plain-text summary. Wording is stable for downstream scripts.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Bulk AP assignment complete!");
        match self.mode {
            AssignmentMode::SingleSite => {
                let _ = writeln!(
                    out,
                    "  Successfully assigned: {} of {} APs",
                    self.succeeded, self.total
                );
            }
            AssignmentMode::MultiSite => {
                let _ = writeln!(
                    out,
                    "  Successfully assigned: {} of {} APs across {} sites",
                    self.succeeded,
                    self.total,
                    self.sites.len()
                );
            }
        }
        let _ = writeln!(out, "  Failed assignments: {}", self.failed);
        let _ = writeln!(out, "  Operation took: {}", format_elapsed(self.elapsed));

        if self.failed > 0 {
            let _ = writeln!(out, "\nFailures:");
            match self.mode {
                AssignmentMode::SingleSite => {
                    for outcome in self.failures() {
                        write_failure(&mut out, "  ", outcome);
                    }
                }
                AssignmentMode::MultiSite => {
                    for site in self.sites.iter().filter(|s| s.failed > 0) {
                        let _ = writeln!(out, "  Site {:?}:", site.site);
                        for outcome in self.failures().filter(|o| o.request.site == site.site) {
                            write_failure(&mut out, "    ", outcome);
                        }
                    }
                }
            }
        }

        out.truncate(out.trim_end().len());
        out
    }
}

fn write_failure(out: &mut String, indent: &str, outcome: &AssignmentOutcome) {
    if let Some(err) = outcome.error() {
        let _ = writeln!(
            out,
            "{indent}#{} {}: {err}",
            outcome.request.index, outcome.original_mac
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::DeviceMac;

    fn request(index: usize, mac: &str, site: &str) -> AssignmentRequest {
        AssignmentRequest {
            index,
            mac: DeviceMac::new(mac),
            site: site.into(),
        }
    }

    fn ok(index: usize, mac: &str, site: &str) -> AssignmentOutcome {
        AssignmentOutcome::succeeded(request(index, mac, site), mac.into(), SiteId::new("s-1"))
    }

    fn err(index: usize, mac: &str, site: &str, error: &SharedError) -> AssignmentOutcome {
        AssignmentOutcome::failed(request(index, mac, site), mac.into(), None, Arc::clone(error))
    }

    #[test]
    fn state_machine_transitions() {
        use BatchState::{Dispatched, Failed, Pending, Resolved, Succeeded};

        assert_eq!(Pending.advance(Resolved), Some(Resolved));
        assert_eq!(Pending.advance(Failed), Some(Failed));
        assert_eq!(Resolved.advance(Dispatched), Some(Dispatched));
        assert_eq!(Dispatched.advance(Succeeded), Some(Succeeded));
        assert_eq!(Pending.advance(Dispatched), None);
        assert_eq!(Pending.advance(Succeeded), None);
        assert_eq!(Succeeded.advance(Failed), None);
        assert!(Failed.is_terminal());
        assert!(!Dispatched.is_terminal());
    }

    #[test]
    fn report_orders_outcomes_by_index() {
        let agg = ResultAggregator::new(AssignmentMode::SingleSite);
        agg.record(ok(3, "c", "X"));
        agg.record(ok(1, "a", "X"));
        agg.record(ok(2, "b", "X"));

        let report = agg.finish();
        let order: Vec<_> = report.outcomes.iter().map(|o| o.request().index).collect();
        assert_eq!(order, [1, 2, 3]);
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded + report.failed, report.total);
    }

    #[test]
    fn single_site_text_without_failures() {
        let agg = ResultAggregator::new(AssignmentMode::SingleSite);
        agg.record(ok(1, "00:11:22:33:44:55", "Site-X"));
        agg.record(ok(2, "00:11:22:33:44:56", "Site-X"));
        let mut report = agg.finish();
        report.elapsed = Duration::from_millis(1_234);

        assert_eq!(
            report.render_text(),
            "Bulk AP assignment complete!\n  \
             Successfully assigned: 2 of 2 APs\n  \
             Failed assignments: 0\n  \
             Operation took: 1s 234ms"
        );
    }

    #[test]
    fn single_site_text_lists_failures() {
        let error: SharedError = Arc::new(CoreError::AssignmentFailed {
            site: "Site-X".into(),
            source: Box::new(CoreError::Timeout),
        });
        let agg = ResultAggregator::new(AssignmentMode::SingleSite);
        agg.record(err(2, "00:11:22:33:44:56", "Site-X", &error));
        agg.record(err(1, "00:11:22:33:44:55", "Site-X", &error));
        let mut report = agg.finish();
        report.elapsed = Duration::from_millis(5);

        assert_eq!(
            report.render_text(),
            "Bulk AP assignment complete!\n  \
             Successfully assigned: 0 of 2 APs\n  \
             Failed assignments: 2\n  \
             Operation took: 5ms\n\
             \n\
             Failures:\n  \
             #1 00:11:22:33:44:55: failed to assign devices to site 'Site-X': Request timed out\n  \
             #2 00:11:22:33:44:56: failed to assign devices to site 'Site-X': Request timed out"
        );
        assert!(Arc::ptr_eq(report.first_error().unwrap(), &error));
    }

    #[test]
    fn multi_site_text_groups_failures_by_site() {
        let missing: SharedError = Arc::new(CoreError::SiteNotFound {
            identifier: "Site-B".into(),
        });
        let agg = ResultAggregator::new(AssignmentMode::MultiSite);
        agg.record_site(
            1,
            "Site-B",
            None,
            BatchState::Failed,
            vec![err(2, "00:11:22:33:44:56", "Site-B", &missing)],
        );
        agg.record_site(
            0,
            "Site-A",
            Some(SiteId::new("s-1")),
            BatchState::Succeeded,
            vec![
                ok(1, "00:11:22:33:44:55", "Site-A"),
                ok(3, "00:11:22:33:44:57", "Site-A"),
            ],
        );
        let mut report = agg.finish();
        report.elapsed = Duration::ZERO;

        assert_eq!(
            report.render_text(),
            "Bulk AP assignment complete!\n  \
             Successfully assigned: 2 of 3 APs across 2 sites\n  \
             Failed assignments: 1\n  \
             Operation took: 0s\n\
             \n\
             Failures:\n  \
             Site \"Site-B\":\n    \
             #2 00:11:22:33:44:56: site not found: Site-B"
        );
        let sites: Vec<_> = report.sites.iter().map(|s| s.site.as_str()).collect();
        assert_eq!(sites, ["Site-A", "Site-B"]);
        assert_eq!(report.sites[1].failed, 1);
    }

    #[test]
    fn report_serializes_errors_as_text() {
        let missing: SharedError = Arc::new(CoreError::SiteNotFound {
            identifier: "Site-B".into(),
        });
        let agg = ResultAggregator::new(AssignmentMode::SingleSite);
        agg.record(err(1, "aa", "Site-B", &missing));
        let json = serde_json::to_value(agg.finish()).unwrap();

        assert_eq!(json["failed"], 1);
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["outcomes"][0]["error"], "site not found: Site-B");
        assert!(json.get("sites").is_none());
    }
}
