// src/engine/runtime.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::dispatcher::{dispatch, DispatchSummary};
use crate::engine::trigger::Trigger;
use crate::errors::{LogTriggerError, Result, ShutdownError};
use crate::watch::{spawn_tail, TailHandle, TailOptions};

/// A file plus the triggers evaluated against each of its new lines.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub triggers: Vec<Trigger>,
}

impl WatchTarget {
    pub fn new(path: impl Into<PathBuf>, triggers: Vec<Trigger>) -> Self {
        Self {
            path: path.into(),
            triggers,
        }
    }
}

/// A started watch target: one tail task feeding one dispatcher task.
#[derive(Debug)]
pub struct RunningTarget {
    path: PathBuf,
    tail: TailHandle,
    dispatcher: JoinHandle<DispatchSummary>,
}

impl RunningTarget {
    /// Start tailing `target.path` from its current end and dispatch lines to
    /// its triggers in a dedicated task.
    pub async fn start(target: WatchTarget, options: TailOptions) -> Result<Self> {
        let WatchTarget { path, triggers } = target;

        let mut tail = spawn_tail(&path, options).await?;
        let lines = tail
            .take_lines()
            .ok_or_else(|| LogTriggerError::Other(anyhow!("tail line stream already taken")))?;

        let triggers: Arc<[Trigger]> = triggers.into();
        let dispatch_path = path.clone();
        let dispatcher =
            tokio::spawn(async move { dispatch(&dispatch_path, lines, &triggers).await });

        info!(file = %path.display(), "watch established");

        Ok(Self {
            path,
            tail,
            dispatcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop the tail and wait for the dispatcher to drain.
    ///
    /// An action already running is awaited, not killed.
    pub async fn stop(self) -> Result<DispatchSummary> {
        let tail_result = self.tail.stop().await;
        let summary = match self.dispatcher.await {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(tail_err) = &tail_result {
                    warn!(file = %self.path.display(), error = %tail_err, "tail also failed to stop");
                }
                return Err(LogTriggerError::Other(anyhow!(
                    "dispatcher for {:?} did not shut down cleanly: {e}",
                    self.path
                )));
            }
        };
        tail_result?;
        info!(file = %self.path.display(), "watch stopped");
        Ok(summary)
    }
}

/// Every running watch target, in startup order.
#[derive(Debug, Default)]
pub struct RunningWatches {
    running: Vec<RunningTarget>,
}

impl RunningWatches {
    pub fn paths(&self) -> Vec<&Path> {
        self.running.iter().map(RunningTarget::path).collect()
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Stop every target in reverse startup order.
    ///
    /// All targets are stopped even if some fail. On success returns the
    /// paths in the order they were stopped.
    pub async fn shutdown(self) -> std::result::Result<Vec<PathBuf>, ShutdownError> {
        let mut stopped = Vec::with_capacity(self.running.len());
        let mut failures = Vec::new();

        for target in self.running.into_iter().rev() {
            let path = target.path.clone();
            match target.stop().await {
                Ok(_) => stopped.push(path),
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "caught error while stopping watch");
                    failures.push((path, err));
                }
            }
        }

        if failures.is_empty() {
            Ok(stopped)
        } else {
            Err(ShutdownError { failures })
        }
    }
}

/// Owns the configured watch targets and their lifecycle.
pub struct Runtime {
    targets: Vec<WatchTarget>,
    options: TailOptions,
}

impl Runtime {
    pub fn new(targets: Vec<WatchTarget>, options: TailOptions) -> Self {
        Self { targets, options }
    }

    /// Start all targets in order.
    ///
    /// If one fails to start, the ones already running are stopped again and
    /// the error is returned.
    pub async fn start(self) -> Result<RunningWatches> {
        let mut watches = RunningWatches::default();

        for target in self.targets {
            let path = target.path.clone();
            match RunningTarget::start(target, self.options).await {
                Ok(running) => watches.running.push(running),
                Err(err) => {
                    let _ = watches.shutdown().await;
                    return Err(LogTriggerError::ConfigError(format!(
                        "cannot watch {}: {}",
                        path.display(),
                        err
                    )));
                }
            }
        }

        Ok(watches)
    }

    /// Start every target, block until `shutdown` resolves, then tear down.
    ///
    /// Teardown failures are logged as warnings and otherwise ignored.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let watches = self.start().await?;
        info!(targets = watches.len(), "logtrigger runtime started");

        shutdown.await;
        info!("shutdown requested, stopping watches");

        if let Err(err) = watches.shutdown().await {
            warn!(error = %err, "some watches did not stop cleanly");
        }

        info!("logtrigger runtime exiting");
        Ok(())
    }
}
