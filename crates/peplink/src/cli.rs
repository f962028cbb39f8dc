//! Clap derive structures for the `peplink` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use peplink_core::{Priority, WanId};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// peplink -- monitor and control Peplink / Pepwave routers
#[derive(Debug, Parser)]
#[command(
    name = "peplink",
    version,
    about = "Monitor and control Peplink routers from the command line",
    long_about = "Monitor and control Peplink / Pepwave routers.\n\n\
        Polls the router's local REST API for WAN status, usage,\n\
        diagnostics, VPN and GPS data, and issues WAN priority and modem\n\
        reset commands.",
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
    /// Router profile to use
    #[arg(long, short = 'p', env = "PEPLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router URL (overrides profile)
    #[arg(long, short = 'u', env = "PEPLINK_URL", global = true)]
    pub url: Option<String>,

    /// Admin username (overrides profile)
    #[arg(long, env = "PEPLINK_USERNAME", global = true)]
    pub username: Option<String>,

    /// Admin password (overrides profile)
    #[arg(long, env = "PEPLINK_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: table]
    #[arg(long, short = 'o', env = "PEPLINK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Verify the router's TLS certificate against the system store
    #[arg(long, env = "PEPLINK_STRICT_TLS", global = true)]
    pub strict_tls: bool,

    /// Request timeout (e.g. "30s")
    #[arg(long, env = "PEPLINK_TIMEOUT", global = true, value_parser = parse_duration)]
    pub timeout: Option<Duration>,
}

/// Parse "30s", "2m", or bare seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|e| e.to_string())
}

fn parse_wan(raw: &str) -> Result<WanId, String> {
    raw.parse().map_err(|e: peplink_core::CoreError| e.to_string())
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    raw.parse().map_err(|e: peplink_core::CoreError| e.to_string())
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
    /// Overview of every WAN with live status, throughput and usage
    #[command(alias = "st")]
    Status,

    /// Inspect and control WAN connections
    #[command(alias = "wan")]
    Wans(WansArgs),

    /// Bandwidth allowance usage per WAN and SIM
    Usage,

    /// Device identity, firmware, sensors and client count
    #[command(alias = "sys")]
    System,

    /// PepVPN / SpeedFusion profiles
    Vpn,

    /// GPS location
    #[command(alias = "gps")]
    Location,

    /// Reachability, authentication and data freshness
    Health,

    /// Keep polling in the background and reprint on an interval
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WANS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WansArgs {
    #[command(subcommand)]
    pub command: WansCommand,
}

#[derive(Debug, Subcommand)]
pub enum WansCommand {
    /// List WAN connections
    #[command(alias = "ls")]
    List,

    /// Set a WAN's priority (1-4, or "disabled")
    SetPriority {
        /// WAN connection id
        #[arg(value_parser = parse_wan)]
        wan: WanId,
        /// Priority level 1-4, or "disabled"
        #[arg(value_parser = parse_priority)]
        priority: Priority,
    },

    /// Reset the cellular modem of a WAN
    ResetModem {
        /// WAN connection id
        #[arg(value_parser = parse_wan)]
        wan: WanId,
    },

    /// Re-probe which WAN connections the router has
    Rediscover,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Watch every configured profile instead of one router
    #[arg(long, short = 'a')]
    pub all: bool,

    /// How often to reprint
    #[arg(long, short = 'i', default_value = "10s", value_parser = parse_duration)]
    pub interval: Duration,

    /// Stop after this many refreshes
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
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
    /// Print the effective configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,
}
