//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;
use tracing::{info, warn};

use mistly_core::{
    ApiInventory, AssignConfig, AssignmentMode, AssignmentSource, BulkAssigner,
    BulkAssignmentReport, CancellationToken, IdentifierResolver, Inventory, InventoryDevice,
};

use crate::cli::{AssignArgs, DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, StatusCell, Tone};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Connected")]
    connected: String,
}

impl DeviceRow {
    fn new(d: &InventoryDevice, color: bool) -> Self {
        let site = match d.site_id {
            Some(ref id) => StatusCell::new(id.as_str(), None),
            None => StatusCell::new("unassigned", Some(Tone::Muted)),
        };
        let connected = if d.connected {
            StatusCell::new("yes", Some(Tone::Good))
        } else {
            StatusCell::new("no", Some(Tone::Bad))
        };

        Self {
            mac: d.mac.to_string(),
            kind: d.kind.label().to_owned(),
            model: util::or_dash(d.model.as_deref()),
            serial: util::or_dash(d.serial.as_deref()),
            name: util::or_dash(d.name.as_deref()),
            site: site.render(color),
            connected: connected.render(color),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    inventory: Arc<ApiInventory>,
    config: AssignConfig,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List {
            kind,
            site,
            unassigned,
        } => {
            let site_id = match site {
                Some(ref raw) => Some(
                    IdentifierResolver::new(inventory.as_ref(), &config)
                        .resolve(raw)
                        .await?,
                ),
                None => None,
            };

            let mut devices = inventory
                .list_devices(&config.org_id, kind.map(util::device_kind))
                .await?;
            devices.retain(|d| match site_id {
                Some(ref id) => d.site_id.as_ref() == Some(id),
                None => !unassigned || !d.is_assigned(),
            });

            let color = output::should_color(global.color);
            let out = output::render_list(
                global.output,
                &devices,
                |d| DeviceRow::new(d, color),
                |d| d.mac.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Assign(args) => assign(inventory, config, args, global).await,
    }
}

// ── Bulk assignment ─────────────────────────────────────────────────

fn assignment_source(args: AssignArgs) -> Result<AssignmentSource, CliError> {
    let AssignArgs {
        macs,
        site,
        file,
        csv,
        ..
    } = args;

    if let Some(path) = csv {
        return Ok(AssignmentSource::CsvFile { path });
    }
    let site = site.ok_or_else(|| CliError::Validation {
        field: "site".into(),
        reason: "--site is required unless --csv is given".into(),
    })?;
    Ok(match file {
        Some(path) => AssignmentSource::MacFile { path, site },
        None => AssignmentSource::Inline { macs, site },
    })
}

async fn assign(
    inventory: Arc<ApiInventory>,
    mut config: AssignConfig,
    args: AssignArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(n) = args.concurrency {
        if n == 0 {
            return Err(CliError::Validation {
                field: "concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        config.max_concurrent_sites = n;
    }

    let source = assignment_source(args)?;
    let assigner = BulkAssigner::new(inventory, config);

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing in-flight batches");
                cancel.cancel();
            }
        }
    });

    let message = match source.mode() {
        AssignmentMode::SingleSite => "Assigning devices".to_owned(),
        AssignmentMode::MultiSite => "Assigning devices across sites".to_owned(),
    };
    let spinner = util::spinner(global, message);
    let result = assigner.bulk_assign(source, &cancel).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    watcher.abort();

    let report = result?;
    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        "bulk assignment done"
    );
    print_report(&report, global)?;

    // A failed batch in single-site mode fails the command; CSV runs
    // report per-site failures and still succeed.
    match (report.mode, report.first_error()) {
        (AssignmentMode::SingleSite, Some(err)) => Err(CliError::AssignmentFailed {
            failed: report.failed,
            total: report.total,
            source: Arc::clone(err),
        }),
        _ => Ok(()),
    }
}

fn print_report(report: &BulkAssignmentReport, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => report.render_text(),
        format => output::render_single(
            format,
            report,
            BulkAssignmentReport::render_text,
            BulkAssignmentReport::render_text,
        )?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args(macs: &[&str], site: Option<&str>, file: Option<&str>, csv: Option<&str>) -> AssignArgs {
        AssignArgs {
            macs: macs.iter().map(|m| (*m).to_owned()).collect(),
            site: site.map(str::to_owned),
            file: file.map(PathBuf::from),
            csv: csv.map(PathBuf::from),
            concurrency: None,
        }
    }

    #[test]
    fn inline_macs_become_inline_source() {
        let source = assignment_source(args(&["aa:01"], Some("Site-X"), None, None)).unwrap();
        assert!(matches!(source, AssignmentSource::Inline { ref site, .. } if site == "Site-X"));
    }

    #[test]
    fn file_wins_over_inline() {
        let source = assignment_source(args(&[], Some("Site-X"), Some("aps.txt"), None)).unwrap();
        assert!(matches!(source, AssignmentSource::MacFile { .. }));
    }

    #[test]
    fn csv_needs_no_site() {
        let source = assignment_source(args(&[], None, None, Some("aps.csv"))).unwrap();
        assert_eq!(source.mode(), AssignmentMode::MultiSite);
    }

    #[test]
    fn single_site_without_site_is_rejected() {
        let err = assignment_source(args(&["aa:01"], None, None, None)).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }
}
