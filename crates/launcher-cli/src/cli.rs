//! CLI argument definitions for the launcher.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ddalab-launcher",
    about = "DDALAB launcher - keep the launcher itself up to date",
    long_about = "Check for and install new releases of the DDALAB launcher.\n\n\
                  Releases are fetched from GitHub; set GITHUB_TOKEN to raise the \
                  API rate limit."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Release registry to query instead of the official one.
    #[arg(long = "registry", value_name = "URL", global = true)]
    pub registry: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print version and platform information.
    Version,

    /// Check whether a newer launcher release is available.
    CheckUpdate,

    /// Download and install the latest launcher release.
    SelfUpdate(SelfUpdateArgs),
}

#[derive(Parser)]
pub struct SelfUpdateArgs {
    /// Install without asking for confirmation.
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
