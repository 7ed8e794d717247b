use std::fmt;
use std::sync::{Arc, Mutex};

use logtrigger::errors::ActionError;
use logtrigger::exec::{ActFuture, Action};
use logtrigger::pattern::Captures;

/// Shared log of every invocation, `(action name, captured fields)`.
pub type Invocations = Arc<Mutex<Vec<(String, Captures)>>>;

pub fn new_invocations() -> Invocations {
    Arc::new(Mutex::new(Vec::new()))
}

/// An action that records its invocations instead of running anything.
///
/// With `failing(...)` it still records the call, then reports an error.
/// With `panicking(...)` it records the call, then panics, taking the
/// dispatcher task down with it.
pub struct RecordingAction {
    name: String,
    invocations: Invocations,
    outcome: Outcome,
}

#[derive(Clone, Copy)]
enum Outcome {
    Succeed,
    Fail,
    Panic,
}

impl RecordingAction {
    pub fn new(name: &str, invocations: Invocations) -> Self {
        Self {
            name: name.to_string(),
            invocations,
            outcome: Outcome::Succeed,
        }
    }

    pub fn failing(name: &str, invocations: Invocations) -> Self {
        Self {
            outcome: Outcome::Fail,
            ..Self::new(name, invocations)
        }
    }

    pub fn panicking(name: &str, invocations: Invocations) -> Self {
        Self {
            outcome: Outcome::Panic,
            ..Self::new(name, invocations)
        }
    }
}

impl fmt::Display for RecordingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recording:{}", self.name)
    }
}

impl Action for RecordingAction {
    fn act<'a>(&'a self, fields: &'a Captures) -> ActFuture<'a> {
        let invocations = Arc::clone(&self.invocations);
        Box::pin(async move {
            {
                let mut guard = invocations.lock().unwrap();
                guard.push((self.name.clone(), fields.clone()));
            }
            match self.outcome {
                Outcome::Succeed => Ok(()),
                Outcome::Fail => Err(ActionError::Other(anyhow::anyhow!(
                    "{} failed on purpose",
                    self.name
                ))),
                Outcome::Panic => panic!("{} panicked on purpose", self.name),
            }
        })
    }
}

/// Names of recorded invocations, in call order.
pub fn invoked_names(invocations: &Invocations) -> Vec<String> {
    invocations
        .lock()
        .unwrap()
        .iter()
        .map(|(name, _)| name.clone())
        .collect()
}
