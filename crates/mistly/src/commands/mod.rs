//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod sites;
pub mod util;

use std::sync::Arc;

use mistly_core::{ApiInventory, AssignConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    inventory: Arc<ApiInventory>,
    config: AssignConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Sites(args) => sites::handle(&inventory, &config, args, global).await,
        Command::Devices(args) => devices::handle(inventory, config, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled before connecting".into(),
        }),
    }
}
