// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `logtrigger`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "logtrigger",
    version,
    about = "Run commands when lines matching a pattern are appended to watched files.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML, or JSON when it ends in `.json`).
    ///
    /// Default: `logtrigger.toml` in the home directory, or `logtrigger.json`
    /// there when only that exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LOGTRIGGER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Shorthand for `--log-level debug`.
    #[arg(long, conflicts_with = "log_level")]
    pub debug: bool,

    /// Parse + validate, print the watch targets, but don't watch anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }

    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            Some(LogLevel::Debug)
        } else {
            self.log_level
        }
    }
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
