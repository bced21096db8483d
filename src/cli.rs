// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `loadgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "loadgate",
    version,
    about = "Load resources concurrently, each one only after its dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the manifest (JSON, or TOML with a `.toml` extension).
    ///
    /// Default: `loadgate.json` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "loadgate.json")]
    pub manifest: String,

    /// Directory resource urls are resolved against.
    ///
    /// Defaults to the manifest's directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LOADGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the dispatch rounds, but don't load anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
