#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use logtrigger::config::{ActionConfig, ConfigFile, RawConfigFile, TailSection, TriggerConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                root: None,
                tail: TailSection::default(),
                triggers: BTreeMap::new(),
            },
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = Some(root.into());
        self
    }

    pub fn with_trigger(mut self, file: &str, trigger: TriggerConfig) -> Self {
        self.config
            .triggers
            .entry(file.to_string())
            .or_default()
            .push(trigger);
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.tail.poll_interval_ms = ms;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TriggerConfig`.
pub struct TriggerConfigBuilder {
    trigger: TriggerConfig,
}

impl TriggerConfigBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            trigger: TriggerConfig {
                pattern: pattern.to_string(),
                action: ActionConfig::default(),
            },
        }
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.trigger.action.cmd = Some(cmd.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.trigger.action.args.push(arg.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.trigger
            .action
            .args
            .extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn build(self) -> TriggerConfig {
        self.trigger
    }
}
