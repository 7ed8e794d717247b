// src/errors.rs

//! Crate-wide error types.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogTriggerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single action invocation.
///
/// These never leave the dispatcher; they are logged against the trigger
/// that produced them.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("command line is empty after interpolation")]
    EmptyProgram,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited unsuccessfully ({status})")]
    ExitStatus { program: String, status: ExitStatus },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Every watch that failed to stop cleanly during teardown, in teardown order.
#[derive(Debug, Default)]
pub struct ShutdownError {
    pub failures: Vec<(PathBuf, LogTriggerError)>,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} watch(es) failed to stop", self.failures.len())?;
        for (path, err) in &self.failures {
            write!(f, "; {}: {}", path.display(), err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownError {}

pub type Result<T> = std::result::Result<T, LogTriggerError>;
