// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`action`] defines the `Action` trait the dispatcher invokes on a match.
//! - [`shell`] provides `ShellAction`, which interpolates argument templates
//!   and runs the resulting command with `tokio::process::Command`.

pub mod action;
pub mod shell;

pub use action::{ActFuture, Action};
pub use shell::ShellAction;
