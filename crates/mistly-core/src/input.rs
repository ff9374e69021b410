//! Input parsers for bulk assignment.
//!
//! Three sources feed the orchestrator: inline MAC arguments, a
//! newline-delimited MAC file, and a `MAC,SiteName` CSV file. Neither file
//! format has a header row or any quoting. Parsing is all-or-nothing: the
//! first problem aborts with an error and no partial result.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::model::DeviceMac;

/// One device-to-site assignment, in original input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRequest {
    /// 1-based position in the input.
    pub index: usize,
    pub mac: DeviceMac,
    /// Raw, unresolved site identifier.
    pub site: String,
}

/// All requests targeting the same raw site identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteGroup {
    pub site: String,
    /// In input order.
    pub requests: Vec<AssignmentRequest>,
    /// MAC fields exactly as they appeared in the file, parallel to `requests`.
    pub original_macs: Vec<String>,
}

/// Parsed CSV: groups in order of each site's first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvAssignments {
    pub groups: Vec<SiteGroup>,
    pub total: usize,
}

/// Read an input file, keeping the path in the error.
pub fn read_input_file(path: &Path) -> Result<String, CoreError> {
    std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn non_blank_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Parse a newline-delimited MAC list.
pub fn parse_mac_list(content: &str, path: &Path) -> Result<Vec<DeviceMac>, CoreError> {
    let macs: Vec<DeviceMac> = non_blank_lines(content)
        .map(|(_, line)| DeviceMac::new(line))
        .collect();

    if macs.is_empty() {
        return Err(CoreError::InvalidInput {
            message: format!("no MAC addresses found in file {}", path.display()),
        });
    }
    Ok(macs)
}

/// Normalize MACs given directly on the command line.
pub fn parse_inline_macs<S: AsRef<str>>(args: &[S]) -> Result<Vec<DeviceMac>, CoreError> {
    let macs: Vec<DeviceMac> = args
        .iter()
        .map(DeviceMac::new)
        .filter(|m| !m.is_empty())
        .collect();

    if macs.is_empty() {
        return Err(CoreError::InvalidInput {
            message: "no MAC addresses provided".into(),
        });
    }
    Ok(macs)
}

/// Parse `MAC,SiteName` lines and group them by site.
///
/// The first comma separates the fields; everything after it is the site
/// name. A line without a comma, or with an empty field, aborts the parse.
pub fn parse_mac_site_csv(content: &str, path: &Path) -> Result<CsvAssignments, CoreError> {
    let mut groups: IndexMap<String, SiteGroup> = IndexMap::new();
    let mut total = 0;

    for (line_no, line) in non_blank_lines(content) {
        let Some((mac_field, site_field)) = line.split_once(',') else {
            return Err(malformed(path, line_no, line));
        };
        let mac = DeviceMac::new(mac_field);
        let site = site_field.trim();
        if mac.is_empty() || site.is_empty() {
            return Err(malformed(path, line_no, line));
        }

        total += 1;
        let group = groups
            .entry(site.to_owned())
            .or_insert_with(|| SiteGroup {
                site: site.to_owned(),
                requests: Vec::new(),
                original_macs: Vec::new(),
            });
        group.requests.push(AssignmentRequest {
            index: total,
            mac,
            site: site.to_owned(),
        });
        group.original_macs.push(mac_field.to_owned());
    }

    if total == 0 {
        return Err(CoreError::InvalidInput {
            message: format!("no MAC addresses found in file {}", path.display()),
        });
    }

    Ok(CsvAssignments {
        groups: groups.into_values().collect(),
        total,
    })
}

fn malformed(path: &Path, line_no: usize, line: &str) -> CoreError {
    CoreError::InvalidInput {
        message: format!(
            "invalid format in file: expected MAC,SITE format (line {line_no} of {}: {line:?})",
            path.display()
        ),
    }
}
