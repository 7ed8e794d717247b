// src/watch/targets.rs

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::config::{ActionConfig, ConfigFile};
use crate::engine::{Trigger, WatchTarget};
use crate::errors::{LogTriggerError, Result};
use crate::exec::{Action, ShellAction};

/// Turn the validated config into compiled watch targets.
///
/// - A trigger with neither `cmd` nor `args` is skipped with a warning.
/// - A file left without triggers is skipped with a warning.
/// - Relative paths are resolved against `root`, or `default_root` when the
///   config has none.
///
/// Fails if a pattern does not compile or nothing is left to watch.
pub fn build_watch_targets(cfg: &ConfigFile, default_root: &Path) -> Result<Vec<WatchTarget>> {
    let mut targets = Vec::with_capacity(cfg.triggers().len());

    for (file, trigger_cfgs) in cfg.triggers().iter() {
        let path = cfg.resolve_path(file, default_root);
        let mut triggers = Vec::with_capacity(trigger_cfgs.len());

        for trigger_cfg in trigger_cfgs {
            let Some(action) = build_action(&path, &trigger_cfg.action)? else {
                warn!(
                    file = %path.display(),
                    pattern = %trigger_cfg.pattern,
                    "skipping trigger with no action"
                );
                continue;
            };

            let trigger = Trigger::new(&trigger_cfg.pattern, action).map_err(|e| {
                LogTriggerError::ConfigError(format!(
                    "could not set up trigger for {}: {}",
                    path.display(),
                    e
                ))
            })?;
            triggers.push(trigger);
        }

        if triggers.is_empty() {
            warn!(file = %path.display(), "skipping watching file with no triggers");
            continue;
        }

        targets.push(WatchTarget::new(path, triggers));
    }

    if targets.is_empty() {
        return Err(LogTriggerError::ConfigError(
            "no file has a usable trigger; nothing to watch".to_string(),
        ));
    }

    Ok(targets)
}

/// `None` when neither `cmd` nor `args` yields a command.
///
/// A `cmd` without any words falls through to `args`.
fn build_action(path: &Path, cfg: &ActionConfig) -> Result<Option<Arc<dyn Action>>> {
    let words = cfg.cmd_words().map_err(|e| {
        LogTriggerError::ConfigError(format!(
            "unparsable cmd for {}: {}",
            path.display(),
            e
        ))
    })?;

    if words.is_none() && cfg.cmd.is_some() {
        warn!(file = %path.display(), "ignoring cmd without any words");
    }

    let action = match words {
        Some(words) => ShellAction::new(words)?,
        None if !cfg.args.is_empty() => ShellAction::new(cfg.args.iter().cloned())?,
        None => return Ok(None),
    };
    let action: Arc<dyn Action> = Arc::new(action);
    Ok(Some(action))
}
