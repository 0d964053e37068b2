use anyhow::Result;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    /// Skip the interactive confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Skip desktop package detection (for Docker containers)
    #[arg(short, long)]
    pub docker: bool,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

/// Represents log levels for controlling the verbosity of logging output.
///
/// Maps directly to the log levels used by the `tracing` crate. Specifying
/// `--log-level debug` will enable debug-level logging output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub fn parse_args() -> Result<Cli> {
    Ok(Cli::parse())
}
