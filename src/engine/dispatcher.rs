// src/engine/dispatcher.rs

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::trigger::Trigger;
use crate::watch::LineEvent;

/// Counters for one dispatcher's lifetime, logged when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub lines: u64,
    pub matches: u64,
    pub failures: u64,
    pub tail_errors: u64,
}

/// Consume a tail's line stream until it ends, running every matching
/// trigger for every line.
///
/// Lines are handled strictly in order, each one completely (all triggers,
/// actions awaited one after another) before the next is received.
pub async fn dispatch(
    file: &Path,
    mut lines: mpsc::Receiver<LineEvent>,
    triggers: &[Trigger],
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    while let Some(event) = lines.recv().await {
        match event {
            LineEvent::Line(line) => {
                summary.lines += 1;
                let outcome = dispatch_line(file, &line, triggers).await;
                summary.matches += outcome.matches;
                summary.failures += outcome.failures;
            }
            LineEvent::Error(err) => {
                summary.tail_errors += 1;
                warn!(file = %file.display(), error = %err, "caught tail error");
            }
        }
    }

    info!(
        file = %file.display(),
        lines = summary.lines,
        matches = summary.matches,
        failures = summary.failures,
        "dispatcher finished"
    );
    summary
}

/// Evaluate all triggers against one line.
///
/// Every trigger is tried regardless of earlier matches or failures; a failed
/// action is logged and does not affect the others.
pub async fn dispatch_line(file: &Path, line: &str, triggers: &[Trigger]) -> DispatchSummary {
    debug!(file = %file.display(), line = %line, "processing line");

    let mut outcome = DispatchSummary {
        lines: 1,
        ..DispatchSummary::default()
    };

    for trigger in triggers {
        let Some(fields) = trigger.apply(line) else {
            continue;
        };
        outcome.matches += 1;
        debug!(
            file = %file.display(),
            pattern = %trigger.pattern(),
            ?fields,
            "trigger matched"
        );

        if let Err(err) = trigger.act(&fields).await {
            outcome.failures += 1;
            error!(
                file = %file.display(),
                action = %trigger.action(),
                error = %err,
                "caught action error"
            );
        }
    }

    outcome
}
