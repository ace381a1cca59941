//! Clap derive structures for the `arcdeck` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use arcdeck_core::Category;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// arcdeck -- console for data controllers and their database instances
#[derive(Debug, Parser)]
#[command(
    name = "arcdeck",
    version,
    about = "Browse data controllers and their managed database instances",
    long_about = "Keeps a list of data controllers, logs in to them, and shows their\n\
        configuration, endpoints, and registered PostgreSQL servers and SQL\n\
        managed instances.",
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
    /// Config file to use instead of the platform default
    #[arg(long, env = "ARCDECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// File holding the list of known controllers
    #[arg(long, env = "ARCDECK_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Never prompt for passwords; fail instead
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
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
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to a data controller and remember it
    Add(AddArgs),

    /// List known controllers
    #[command(alias = "ls")]
    List,

    /// Rename a controller or change where it points
    Edit(EditArgs),

    /// Forget a controller and its stored credentials
    #[command(alias = "rm")]
    Remove(RemoveArgs),

    /// Fetch config, endpoints and registrations
    Refresh(RefreshArgs),

    /// Show the managed instances under a controller
    Tree(TreeArgs),

    /// Refresh periodically and print change events
    Watch(WatchArgs),

    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Controller URL, e.g. https://10.0.0.4:30080
    pub url: Url,

    /// Kubernetes namespace of the data controller
    #[arg(long, short = 'n')]
    pub namespace: String,

    /// Controller username
    #[arg(long, short = 'u')]
    pub username: String,

    /// Display name (defaults to the host)
    #[arg(long)]
    pub name: Option<String>,

    /// Do not store the password in the system keyring
    #[arg(long)]
    pub no_remember: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Controller id or name
    pub controller: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub url: Option<Url>,

    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Store (true) or stop storing (false) the password
    #[arg(long)]
    pub remember: Option<bool>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Controller id or name
    pub controller: String,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Controller id or name (all controllers when omitted)
    pub controller: Option<String>,

    /// Only these categories
    #[arg(long = "category", short = 'C', value_delimiter = ',')]
    pub categories: Vec<Category>,

    /// Ask for the password again even if one is cached
    #[arg(long)]
    pub reauth: bool,
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Controller id or name (all controllers when omitted)
    pub controller: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Controller id or name (all controllers when omitted)
    pub controller: Option<String>,

    /// Seconds between refreshes (defaults to the configured interval, or 30)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print where the config and state files live
    Path,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
