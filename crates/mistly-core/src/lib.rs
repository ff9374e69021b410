//! Identifier resolution and bulk device assignment for `mistly`.
//!
//! This crate sits between `mistly-api` and the CLI:
//!
//! - **[`Inventory`]**: the seam to the remote inventory. [`ApiInventory`]
//!   implements it over [`mistly_api::MistClient`]; tests plug in fakes.
//!
//! - **[`IdentifierResolver`]**: classifies a raw identifier (canonical ID,
//!   site code, or free-text name) and resolves it to a [`SiteId`] with
//!   exactly one inventory round trip.
//!
//! - **[`input`]**: parsers for inline MAC lists, newline-delimited MAC
//!   files and `MAC,SiteName` CSV files.
//!
//! - **[`BulkAssigner`]**: drives single-site and multi-site assignment runs
//!   and produces a [`BulkAssignmentReport`] through the [`ResultAggregator`].

pub mod assign;
pub mod config;
pub mod convert;
pub mod error;
pub mod input;
pub mod inventory;
pub mod model;
pub mod resolve;

// ── Primary re-exports ──────────────────────────────────────────────
pub use assign::report::{
    AssignmentMode, AssignmentOutcome, BatchState, BulkAssignmentReport, OutcomeStatus,
    ResultAggregator, SharedError, SiteSummary,
};
pub use assign::{AssignmentSource, BulkAssigner};
pub use config::{AssignConfig, ConnectionConfig, NameMatch, TlsVerification};
pub use error::CoreError;
pub use input::{AssignmentRequest, CsvAssignments, SiteGroup};
pub use inventory::{ApiInventory, Inventory};
pub use model::{DeviceKind, DeviceMac, InventoryDevice, OrgId, Site, SiteId};
pub use resolve::{IdentifierKind, IdentifierResolver, ResolvedSite};

// Re-exported so callers can cancel a bulk run without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;
