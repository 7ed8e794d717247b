// src/watch/mod.rs

//! File tailing and watch target setup.
//!
//! This module is responsible for:
//! - Following individual files from their end and turning appended bytes
//!   into line events (`tail.rs`), with `notify` providing wake-ups.
//! - Compiling the configured triggers per file into watch targets
//!   (`targets.rs`).
//!
//! It does **not** evaluate patterns or run actions; that is the engine's job.

pub mod tail;
pub mod targets;

pub use tail::{spawn_tail, LineEvent, TailHandle, TailOptions};
pub use targets::build_watch_targets;
