//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use mistly_core::DeviceKind;

use crate::cli::{DeviceKindArg, GlobalOpts};
use crate::error::CliError;

pub fn device_kind(arg: DeviceKindArg) -> DeviceKind {
    match arg {
        DeviceKindArg::Ap => DeviceKind::AccessPoint,
        DeviceKindArg::Switch => DeviceKind::Switch,
        DeviceKindArg::Gateway => DeviceKind::Gateway,
    }
}

/// Spinner on stderr, only when it is an interactive terminal.
pub fn spinner(global: &GlobalOpts, message: String) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Optional text as a table cell.
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}
