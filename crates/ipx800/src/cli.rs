//! Clap derive structures for the `ipx800` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ipx800_core::Platform;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ipx800 -- inspect what an IPX800 V5 hub turns into
#[derive(Debug, Parser)]
#[command(
    name = "ipx800",
    version,
    about = "Discover and reconcile IPX800 V5 devices",
    long_about = "Reconciles the devices declared in your configuration with the\n\
        hardware discovered on an IPX800 V5 hub, and shows the resulting\n\
        per-platform device list.",
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
    /// Hub profile to use
    #[arg(long, short = 'H', env = "IPX800_HUB", global = true)]
    pub hub: Option<String>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "IPX800_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "IPX800_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the reconciled device list for a hub snapshot
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show what auto-discovery finds, ignoring declarations
    Discover(DiscoverArgs),

    /// Inspect and validate the configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Hub snapshot (JSON: hub, system, extensions, objects, state)
    #[arg(long, short = 's')]
    pub snapshot: PathBuf,

    /// Only show one platform
    #[arg(long, short = 'P', value_parser = parse_platform)]
    pub platform: Option<Platform>,

    /// List the declarations that were skipped instead of the devices
    #[arg(long)]
    pub rejected: bool,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Hub snapshot (JSON: hub, system, extensions, objects, state)
    #[arg(long, short = 's')]
    pub snapshot: PathBuf,

    /// Discover every kind, ignoring the profile's `devices_auto`
    #[arg(long)]
    pub all: bool,
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse().map_err(|_| {
        format!(
            "unknown platform '{s}' (expected switch, light, binary_sensor, sensor, \
             cover, climate, number, select or button)"
        )
    })
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration file path
    Path,
    /// Show the effective configuration (secrets masked)
    Show,
    /// Check declared devices of every hub (or of --hub)
    Validate,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
