//! Clap derive structures for the `hydrohomie` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Entry point ──────────────────────────────────────────────────────

/// hydrohomie -- monitor and control a fleet of irrigation devices
#[derive(Debug, Parser)]
#[command(
    name = "hydrohomie",
    version,
    about = "Monitor and control HydroHomie irrigation devices from the command line",
    long_about = "Keeps a directory of HydroHomie devices on the local network, shows\n\
        their tank level, temperature and watering countdown, and changes their\n\
        watering schedule.",
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

// ── Flags accepted by every subcommand ───────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "HYDROHOMIE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Log more to stderr; repeat for debug and trace
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print only errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Assume yes for destructive actions such as removal
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Per-request timeout in seconds (overrides config)
    #[arg(long, env = "HYDROHOMIE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Device directory file (overrides config)
    #[arg(long, env = "HYDROHOMIE_DIRECTORY", global = true, value_name = "FILE")]
    pub directory: Option<PathBuf>,
}

// ── Rendering choices ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rounded table for a terminal
    Table,
    /// Indented JSON
    Json,
    /// One JSON document per line
    JsonCompact,
    /// YAML
    Yaml,
    /// Bare addresses or values, one per line
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal
    Auto,
    /// Color even when piped
    Always,
    /// No ANSI escapes
    Never,
}

// ── Subcommands ──────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the device directory and inspect devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Start a watering cycle now
    Water(TargetArgs),

    /// Stop a watering cycle in progress
    Stop(TargetArgs),

    /// Show a device's recent temperature and tank readings
    History(TargetArgs),

    /// Poll the fleet continuously and redraw the overview
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Print a completion script for a shell
    Completions(CompletionsArgs),
}

/// A single device address.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Device address (host or host:port)
    pub address: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices in the directory with their latest readings
    #[command(alias = "ls")]
    List {
        /// Only print the directory, without querying devices
        #[arg(long)]
        offline: bool,
    },

    /// Show one device in detail, including its watering countdown
    Show {
        /// Device address
        address: String,
    },

    /// Add a device after checking it answers
    Add {
        /// Device address (host or host:port)
        address: String,
    },

    /// Remove a device from the directory
    #[command(alias = "rm")]
    Remove {
        /// Device address
        address: String,
    },

    /// Change a device's name or watering schedule
    Configure {
        /// Device address
        address: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// How long each watering lasts (e.g. "30s", "2m")
        #[arg(long, value_name = "DURATION")]
        duration: Option<humantime::Duration>,

        /// Time between waterings (e.g. "1h", "12h 30m")
        #[arg(long, value_name = "DURATION")]
        interval: Option<humantime::Duration>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many redraws (default: run until interrupted)
    #[arg(long, short = 'n')]
    pub count: Option<u64>,

    /// Highlight one device's countdown below the overview
    #[arg(long, short = 's', value_name = "ADDRESS")]
    pub select: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the local settings file
    Show,

    /// Change one local setting
    Set {
        /// Config key (dot-separated, e.g. "engine.status_interval")
        key: String,

        /// New value, validated before saving
        value: String,
    },

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
