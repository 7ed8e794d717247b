// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::watch::TailOptions;

/// Configuration as read from disk, before validation.
///
/// TOML form:
///
/// ```toml
/// root = "/var/log"
///
/// [tail]
/// poll_interval_ms = 250
///
/// [[triggers."app.log"]]
/// pattern = "ERROR: {msg}"
/// action = { args = ["notify", "{msg}"] }
///
/// [[triggers."app.log"]]
/// pattern = "*panic*"
/// action = { cmd = "logger -t app 'panic seen'" }
/// ```
///
/// The capitalised JSON keys (`Root`, `Triggers`, `Pattern`, `Action`, `Cmd`,
/// `Args`) are accepted as aliases.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Base directory for relative watch paths.
    #[serde(default, alias = "Root")]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub tail: TailSection,

    /// Watched file path -> triggers for that file, in evaluation order.
    #[serde(default, alias = "Triggers")]
    pub triggers: BTreeMap<String, Vec<TriggerConfig>>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means
/// every pattern is non-empty and compiles, every `cmd` tokenizes and the
/// `[tail]` values are within bounds.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    root: Option<PathBuf>,
    tail: TailSection,
    triggers: BTreeMap<String, Vec<TriggerConfig>>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        root: Option<PathBuf>,
        tail: TailSection,
        triggers: BTreeMap<String, Vec<TriggerConfig>>,
    ) -> Self {
        Self {
            root,
            tail,
            triggers,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn tail(&self) -> &TailSection {
        &self.tail
    }

    pub fn triggers(&self) -> &BTreeMap<String, Vec<TriggerConfig>> {
        &self.triggers
    }

    /// Resolve a configured watch path against `root`, falling back to
    /// `default_root` (normally the config file's directory).
    pub fn resolve_path(&self, file: &str, default_root: &Path) -> PathBuf {
        let path = PathBuf::from(file);
        if path.is_absolute() {
            return path;
        }
        match &self.root {
            Some(root) => root.join(path),
            None => default_root.join(path),
        }
    }
}

/// `[tail]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TailSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Longest line kept in memory while waiting for its newline.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_channel_capacity() -> usize {
    64
}

fn default_max_line_bytes() -> usize {
    1024 * 1024
}

impl Default for TailSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            channel_capacity: default_channel_capacity(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

impl TailSection {
    pub fn to_options(&self) -> TailOptions {
        TailOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            channel_capacity: self.channel_capacity,
            max_line_bytes: self.max_line_bytes,
        }
    }
}

/// One `[[triggers."<file>"]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    #[serde(default, alias = "Pattern")]
    pub pattern: String,

    #[serde(default, alias = "Action")]
    pub action: ActionConfig,
}

/// What to run on a match: either a command line or an argument vector.
///
/// `cmd` wins when both are set and it holds at least one word. When neither
/// yields a command the trigger is skipped with a warning.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ActionConfig {
    #[serde(default, alias = "Cmd")]
    pub cmd: Option<String>,

    #[serde(default, alias = "Args")]
    pub args: Vec<String>,
}

impl ActionConfig {
    /// `cmd` split into words; `Ok(None)` when it is unset or holds no words.
    pub fn cmd_words(&self) -> Result<Option<Vec<String>>, shell_words::ParseError> {
        let Some(cmd) = self.cmd.as_deref() else {
            return Ok(None);
        };
        let words = shell_words::split(cmd)?;
        Ok((!words.is_empty()).then_some(words))
    }
}
