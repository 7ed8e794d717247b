// src/watch/tail.rs

//! Follow a single file from its current end, line by line.
//!
//! Each tail runs in its own Tokio task and forwards [`LineEvent`]s over a
//! bounded channel. It wakes up on `notify` events for the file's parent
//! directory and, as a fallback, on a fixed polling interval.
//!
//! The cursor starts at end-of-file, so content written before the tail was
//! spawned is never delivered. Truncation and rotation are handled here:
//!
//! - truncation (file shorter than the cursor): continue from offset 0;
//! - rotation (the path now names a different file): finish reading the old
//!   handle, then continue with the new file from offset 0.
//!
//! A path that does not exist yet is waited for and, once created, read from
//! the start.
//!
//! A line longer than [`TailOptions::max_line_bytes`] is dropped: the tail
//! reports a [`LineEvent::Error`] and skips ahead to the next newline.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{LogTriggerError, Result};

const READ_CHUNK: usize = 8 * 1024;

/// One item of a tail's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete line, without its line terminator.
    Line(String),
    /// A transient read problem. The tail keeps going.
    Error(String),
}

/// Knobs for a tail.
#[derive(Debug, Clone, Copy)]
pub struct TailOptions {
    /// Upper bound on how long new content can go unnoticed when filesystem
    /// notifications are unavailable or missed.
    pub poll_interval: Duration,
    /// Capacity of the line channel between tail and dispatcher.
    pub channel_capacity: usize,
    /// Longest line buffered while waiting for its newline.
    pub max_line_bytes: usize,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            channel_capacity: 64,
            max_line_bytes: 1024 * 1024,
        }
    }
}

/// Handle for a running tail.
///
/// Dropping the handle also stops the tail, but [`TailHandle::stop`] waits for
/// the task to finish and reports failures.
pub struct TailHandle {
    path: PathBuf,
    lines: Option<mpsc::Receiver<LineEvent>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for TailHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl TailHandle {
    /// Take the line stream. Returns `None` on every call after the first.
    pub fn take_lines(&mut self) -> Option<mpsc::Receiver<LineEvent>> {
        self.lines.take()
    }

    /// Stop tailing: the task exits, the file handle is released and the line
    /// stream ends.
    pub async fn stop(self) -> Result<()> {
        // Receiver may already be gone if the task ended on its own.
        let _ = self.stop_tx.send(true);
        self.task.await.map_err(|e| {
            LogTriggerError::Other(anyhow!(
                "tail task for {:?} did not shut down cleanly: {e}",
                self.path
            ))
        })
    }
}

/// Start following `path` from its current end.
///
/// Fails only for problems that make the watch pointless from the outset,
/// e.g. the path is a directory or cannot be opened. A missing file is not an
/// error.
pub async fn spawn_tail(path: impl Into<PathBuf>, options: TailOptions) -> Result<TailHandle> {
    let path = path.into();

    let cursor = match Cursor::open(&path, SeekFrom::End(0)).await {
        Ok(cursor) => Some(cursor),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(file = %path.display(), "file does not exist yet; waiting for it to appear");
            None
        }
        Err(err) => return Err(err.into()),
    };

    let wake = Arc::new(Notify::new());
    let watcher = match watch_parent(&path, Arc::clone(&wake)) {
        Ok(w) => Some(w),
        Err(err) => {
            warn!(
                file = %path.display(),
                error = %err,
                "filesystem notifications unavailable; falling back to polling"
            );
            None
        }
    };

    let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));
    let (stop_tx, stop_rx) = watch::channel(false);

    let tailer = Tailer {
        path: path.clone(),
        missing_reported: cursor.is_none(),
        cursor,
        pending: Vec::new(),
        scanned: 0,
        discarding: false,
        max_line_bytes: options.max_line_bytes.max(1),
        tx,
        stop_rx,
    };

    let task = tokio::spawn(tailer.run(options.poll_interval, wake, watcher));

    Ok(TailHandle {
        path,
        lines: Some(rx),
        stop_tx,
        task,
    })
}

/// Open file plus how far into it we have read.
struct Cursor {
    file: File,
    offset: u64,
    id: Option<FileId>,
}

impl Cursor {
    async fn open(path: &Path, from: SeekFrom) -> std::io::Result<Self> {
        let mut file = File::open(path).await?;
        let meta = file.metadata().await?;
        if meta.is_dir() {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            ));
        }
        let offset = file.seek(from).await?;
        Ok(Self {
            file,
            offset,
            id: file_id(&meta),
        })
    }
}

enum Flow {
    Continue,
    Stop,
}

struct Tailer {
    path: PathBuf,
    cursor: Option<Cursor>,
    /// Bytes after the last newline seen.
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    /// Skipping the rest of an over-long line.
    discarding: bool,
    max_line_bytes: usize,
    missing_reported: bool,
    tx: mpsc::Sender<LineEvent>,
    stop_rx: watch::Receiver<bool>,
}

impl Tailer {
    async fn run(
        mut self,
        poll_interval: Duration,
        wake: Arc<Notify>,
        // Held so notifications keep flowing for the lifetime of the task.
        _watcher: Option<RecommendedWatcher>,
    ) {
        info!(file = %self.path.display(), "tail started");
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if let Flow::Stop = self.poll().await {
                break;
            }

            tokio::select! {
                _ = stopped(&mut self.stop_rx) => break,
                _ = wake.notified() => {}
                _ = ticker.tick() => {}
            }
        }

        debug!(file = %self.path.display(), "tail stopped");
    }

    /// Read whatever is new and deal with truncation/rotation.
    async fn poll(&mut self) -> Flow {
        if self.cursor.is_none() && !self.reopen().await {
            return Flow::Continue;
        }

        if let Flow::Stop = self.drain().await {
            return Flow::Stop;
        }

        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // Rotated away and not yet recreated; keep the old handle so a
                // late writer is still seen.
                if !self.missing_reported {
                    debug!(file = %self.path.display(), "file disappeared; waiting for it to return");
                    self.missing_reported = true;
                }
                return Flow::Continue;
            }
            Err(err) => return self.send(LineEvent::Error(err.to_string())).await,
        };

        let Some(cursor) = self.cursor.as_mut() else {
            return Flow::Continue;
        };

        let rotated = match (cursor.id, file_id(&meta)) {
            (Some(old), Some(new)) => old != new,
            _ => false,
        };

        if rotated {
            info!(file = %self.path.display(), "file rotated; reopening");
            if let Flow::Stop = self.flush_partial().await {
                return Flow::Stop;
            }
            self.cursor = None;
            if self.reopen().await {
                return self.drain().await;
            }
        } else if meta.len() < cursor.offset {
            info!(
                file = %self.path.display(),
                offset = cursor.offset,
                len = meta.len(),
                "file truncated; reading from start"
            );
            // Same as `reset_partial`, inlined so `cursor` stays borrowed.
            self.pending.clear();
            self.scanned = 0;
            self.discarding = false;
            match cursor.file.seek(SeekFrom::Start(0)).await {
                Ok(_) => {
                    cursor.offset = 0;
                    return self.drain().await;
                }
                Err(err) => {
                    // Force a fresh open next time round.
                    self.cursor = None;
                    return self.send(LineEvent::Error(err.to_string())).await;
                }
            }
        }

        Flow::Continue
    }

    /// Open the path from the start. Returns false if it is still missing.
    async fn reopen(&mut self) -> bool {
        match Cursor::open(&self.path, SeekFrom::Start(0)).await {
            Ok(cursor) => {
                if self.missing_reported {
                    info!(file = %self.path.display(), "file appeared; tailing from start");
                }
                self.missing_reported = false;
                self.cursor = Some(cursor);
                true
            }
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                warn!(file = %self.path.display(), error = %err, "failed to open file");
                false
            }
        }
    }

    /// Read to the current end of the open file, emitting complete lines.
    async fn drain(&mut self) -> Flow {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            if self.stop_requested() {
                return Flow::Stop;
            }
            let Some(cursor) = self.cursor.as_mut() else {
                return Flow::Continue;
            };
            match cursor.file.read(&mut buf).await {
                Ok(0) => return Flow::Continue,
                Ok(n) => {
                    cursor.offset += n as u64;
                    self.pending.extend_from_slice(&buf[..n]);
                    if let Flow::Stop = self.emit_lines().await {
                        return Flow::Stop;
                    }
                }
                Err(err) => return self.send(LineEvent::Error(err.to_string())).await,
            }
        }
    }

    /// Emit every complete line in `pending`. Only bytes appended since the
    /// last call are searched for newlines.
    async fn emit_lines(&mut self) -> Flow {
        let mut start = 0;
        let mut search_from = self.scanned;

        loop {
            let Some(rel) = self.pending[search_from..].iter().position(|b| *b == b'\n') else {
                break;
            };
            let end = search_from + rel;
            let skip = std::mem::take(&mut self.discarding);
            let line = (!skip).then(|| decode_line(&self.pending[start..end]));
            start = end + 1;
            search_from = start;

            if let Some(line) = line {
                if let Flow::Stop = self.send(LineEvent::Line(line)).await {
                    return Flow::Stop;
                }
            }
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_line_bytes {
            let was_discarding = self.discarding;
            self.reset_partial();
            self.discarding = true;
            if !was_discarding {
                let msg = format!(
                    "line longer than {} bytes; discarding it",
                    self.max_line_bytes
                );
                return self.send(LineEvent::Error(msg)).await;
            }
        }
        Flow::Continue
    }

    /// An unterminated last line of a rotated-out file will never be
    /// completed, so deliver it as is.
    async fn flush_partial(&mut self) -> Flow {
        let discarding = self.discarding;
        let raw = std::mem::take(&mut self.pending);
        self.reset_partial();
        if raw.is_empty() || discarding {
            return Flow::Continue;
        }
        self.send(LineEvent::Line(decode_line(&raw))).await
    }

    fn reset_partial(&mut self) {
        self.pending.clear();
        self.scanned = 0;
        self.discarding = false;
    }

    /// True once a stop was requested or the handle was dropped.
    fn stop_requested(&self) -> bool {
        self.stop_rx.has_changed().is_err() || *self.stop_rx.borrow()
    }

    /// Deliver one event, giving up if the consumer is gone or a stop is
    /// requested while waiting for channel capacity.
    async fn send(&mut self, event: LineEvent) -> Flow {
        if let LineEvent::Error(ref msg) = event {
            warn!(file = %self.path.display(), error = %msg, "tail read error");
        }
        tokio::select! {
            biased;
            _ = stopped(&mut self.stop_rx) => Flow::Stop,
            res = self.tx.send(event) => match res {
                Ok(()) => Flow::Continue,
                Err(_) => Flow::Stop,
            },
        }
    }
}

/// Strip a trailing `\r` and decode lossily.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Resolves once a stop was requested or the handle was dropped.
async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Register a non-recursive watch on the parent directory; every event that
/// mentions our file name wakes the tail.
fn watch_parent(path: &Path, wake: Arc<Notify>) -> notify::Result<RecommendedWatcher> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path.file_name().map(|n| n.to_os_string());

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // Errors here are covered by the polling fallback.
            if let Ok(event) = res {
                let relevant = match &name {
                    Some(name) => event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(name.as_os_str())),
                    None => true,
                };
                if relevant {
                    wake.notify_one();
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileId {
    dev: u64,
    ino: u64,
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    Some(FileId {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> Option<FileId> {
    None
}
