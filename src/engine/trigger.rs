// src/engine/trigger.rs

use std::fmt;
use std::sync::Arc;

use crate::errors::{LogTriggerError, Result};
use crate::exec::{ActFuture, Action};
use crate::pattern::{Captures, Pattern};

/// "If this pattern matches, run this action."
#[derive(Clone)]
pub struct Trigger {
    pattern: Pattern,
    action: Arc<dyn Action>,
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("pattern", &self.pattern.as_str())
            .field("action", &self.action.to_string())
            .finish()
    }
}

impl Trigger {
    /// Compile `pattern` and bind it to `action`.
    pub fn new(pattern: &str, action: Arc<dyn Action>) -> Result<Self> {
        if pattern.is_empty() {
            return Err(LogTriggerError::ConfigError(
                "trigger pattern must not be empty".to_string(),
            ));
        }
        Ok(Self::from_parts(Pattern::compile(pattern)?, action))
    }

    pub fn from_parts(pattern: Pattern, action: Arc<dyn Action>) -> Self {
        Self { pattern, action }
    }

    pub fn apply(&self, line: &str) -> Option<Captures> {
        self.pattern.apply(line)
    }

    pub fn act<'a>(&'a self, fields: &'a Captures) -> ActFuture<'a> {
        self.action.act(fields)
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn action(&self) -> &dyn Action {
        self.action.as_ref()
    }
}
