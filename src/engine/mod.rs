// src/engine/mod.rs

//! Watch-match-act engine.
//!
//! This module ties together:
//! - [`trigger`]: a compiled pattern bound to an action
//! - [`dispatcher`]: the per-file loop that evaluates every trigger against
//!   every new line and contains action failures
//! - [`runtime`]: starting one tail + dispatcher pair per watched file,
//!   waiting for shutdown, and tearing everything down in reverse order

pub mod dispatcher;
pub mod runtime;
pub mod trigger;

pub use dispatcher::{dispatch, dispatch_line, DispatchSummary};
pub use runtime::{RunningTarget, RunningWatches, Runtime, WatchTarget};
pub use trigger::Trigger;
