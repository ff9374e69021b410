//! Clap derive structures for the `mistly` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.
//! Also compiled by `build.rs` for man pages, so it may only use clap.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mistly -- resolve sites and bulk-assign devices in a Mist organization
#[derive(Debug, Parser)]
#[command(
    name = "mistly",
    version,
    about = "Resolve Mist sites and bulk-assign inventory devices",
    long_about = "Assign claimed access points to sites in bulk.\n\n\
        Sites may be given as canonical IDs, short site codes (US-NYC-HQ01),\n\
        or plain site names. MACs come from arguments, a MAC-per-line file,\n\
        or a MAC,SiteName CSV file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "MISTLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API host (overrides profile)
    #[arg(long, env = "MISTLY_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Organization ID (overrides profile)
    #[arg(long, env = "MISTLY_ORG", global = true)]
    pub org: Option<String>,

    /// API token
    #[arg(long, env = "MISTLY_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MISTLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip TLS certificate verification
    #[arg(long, short = 'k', env = "MISTLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MISTLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect sites and resolve site identifiers
    #[command(alias = "s")]
    Sites(SitesArgs),

    /// List inventory and assign devices to sites
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Sites ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List all sites of the organization
    #[command(alias = "ls")]
    List,

    /// Show how an identifier resolves to a site
    Resolve {
        /// Canonical site ID, site code, or site name
        identifier: String,
    },
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List claimed inventory devices
    #[command(alias = "ls")]
    List {
        /// Only devices of this type
        #[arg(long = "type", short = 't')]
        kind: Option<DeviceKindArg>,

        /// Only devices assigned to this site (ID, code, or name)
        #[arg(long, short = 's')]
        site: Option<String>,

        /// Only devices not assigned to any site
        #[arg(long, conflicts_with = "site")]
        unassigned: bool,
    },

    /// Assign devices to sites in bulk
    Assign(AssignArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceKindArg {
    /// Access points
    Ap,
    /// Switches
    Switch,
    /// Gateways
    Gateway,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["macs", "file", "csv"])
))]
pub struct AssignArgs {
    /// MAC addresses to assign
    pub macs: Vec<String>,

    /// Target site: canonical ID, site code, or site name
    #[arg(
        long,
        short = 's',
        required_unless_present = "csv",
        conflicts_with = "csv"
    )]
    pub site: Option<String>,

    /// File with one MAC address per line
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// CSV file with MAC,SiteName lines (no header)
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Sites processed at once in CSV mode (overrides profile)
    #[arg(long, short = 'j', requires = "csv")]
    pub concurrency: Option<usize>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the current configuration (tokens redacted)
    Show,

    /// Set a profile value
    Set {
        /// Key (api_url, org_id, api_token_env, case_insensitive_names,
        /// max_concurrent_sites, ca_cert, insecure, timeout)
        key: String,
        /// Value
        value: String,
    },

    /// Store the API token for the active profile in the system keyring
    SetToken,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
