// src/exec/action.rs

//! Pluggable action abstraction.
//!
//! The dispatcher talks to an `Action` trait object instead of spawning
//! processes itself. [`ShellAction`](super::shell::ShellAction) is the
//! built-in implementation; tests (and future variants such as webhooks) can
//! provide their own without touching the dispatcher.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::errors::ActionError;
use crate::pattern::Captures;

/// Boxed future returned by [`Action::act`].
pub type ActFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ActionError>> + Send + 'a>>;

/// Unit of work run when a trigger's pattern matches a line.
///
/// `Display` is used to attribute failures in logs, so it should describe
/// what the action does (e.g. the command line).
pub trait Action: Send + Sync + fmt::Display {
    /// Run the action with the fields captured from the matching line.
    ///
    /// The returned future completes when the work is done; the dispatcher
    /// awaits it before evaluating the next trigger.
    fn act<'a>(&'a self, fields: &'a Captures) -> ActFuture<'a>;
}
