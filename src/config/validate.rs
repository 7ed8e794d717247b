// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LogTriggerError, Result};
use crate::pattern::Pattern;

/// Upper bound for `[tail].poll_interval_ms` (one hour).
pub const MAX_POLL_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Upper bound for `[tail].channel_capacity`.
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 20;

/// Upper bound for `[tail].max_line_bytes` (256 MiB).
pub const MAX_LINE_BYTES_LIMIT: usize = 256 * 1024 * 1024;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::LogTriggerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.root, raw.tail, raw.triggers))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_files(cfg)?;
    validate_tail_section(cfg)?;
    validate_triggers(cfg)?;
    Ok(())
}

fn ensure_has_files(cfg: &RawConfigFile) -> Result<()> {
    if cfg.triggers.is_empty() {
        return Err(LogTriggerError::ConfigError(
            "config must contain at least one [[triggers.\"<file>\"]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_tail_section(cfg: &RawConfigFile) -> Result<()> {
    let tail = &cfg.tail;
    ensure_in_range("poll_interval_ms", tail.poll_interval_ms, MAX_POLL_INTERVAL_MS)?;
    ensure_in_range(
        "channel_capacity",
        tail.channel_capacity as u64,
        MAX_CHANNEL_CAPACITY as u64,
    )?;
    ensure_in_range(
        "max_line_bytes",
        tail.max_line_bytes as u64,
        MAX_LINE_BYTES_LIMIT as u64,
    )?;
    Ok(())
}

fn ensure_in_range(key: &str, value: u64, max: u64) -> Result<()> {
    if value == 0 || value > max {
        return Err(LogTriggerError::ConfigError(format!(
            "[tail].{key} must be between 1 and {max} (got {value})"
        )));
    }
    Ok(())
}

/// Patterns and command lines are checked here so a bad entry aborts startup
/// instead of surfacing on the first matching line.
///
/// Triggers without any action are *not* rejected; they are dropped with a
/// warning when watch targets are built.
fn validate_triggers(cfg: &RawConfigFile) -> Result<()> {
    for (file, triggers) in cfg.triggers.iter() {
        if file.trim().is_empty() {
            return Err(LogTriggerError::ConfigError(
                "watched file path must not be empty".to_string(),
            ));
        }

        for (idx, trigger) in triggers.iter().enumerate() {
            if trigger.pattern.is_empty() {
                return Err(LogTriggerError::ConfigError(format!(
                    "trigger #{} for '{}' has an empty pattern",
                    idx + 1,
                    file
                )));
            }

            Pattern::compile(&trigger.pattern).map_err(|e| {
                LogTriggerError::ConfigError(format!(
                    "trigger #{} for '{}': {}",
                    idx + 1,
                    file,
                    e
                ))
            })?;

            trigger.action.cmd_words().map_err(|e| {
                LogTriggerError::ConfigError(format!(
                    "trigger #{} for '{}' has an unparsable cmd {:?}: {}",
                    idx + 1,
                    file,
                    trigger.action.cmd.as_deref().unwrap_or_default(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}
