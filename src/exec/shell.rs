// src/exec/shell.rs

use std::fmt;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{ActionError, LogTriggerError, Result};
use crate::exec::action::{ActFuture, Action};
use crate::pattern::{interpolate, Captures};

/// Runs an external program built from argument templates.
///
/// Each template is interpolated separately and handed to the OS as its own
/// argument; no shell is involved, so captured values cannot inject extra
/// arguments or commands.
#[derive(Debug, Clone)]
pub struct ShellAction {
    args: Vec<String>,
}

impl ShellAction {
    /// Build an action from an explicit argument vector.
    ///
    /// The first element is the program. An empty vector is rejected here
    /// rather than silently doing nothing at match time.
    pub fn new<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(LogTriggerError::ConfigError(
                "shell action needs at least one argument".to_string(),
            ));
        }
        Ok(Self { args })
    }

    /// Build an action from a single command line, split with POSIX shell
    /// quoting rules (`notify-send "disk {msg}"` gives two arguments).
    pub fn from_command_line(cmd: &str) -> Result<Self> {
        let args = shell_words::split(cmd).map_err(|e| {
            LogTriggerError::ConfigError(format!("cannot tokenize command {cmd:?}: {e}"))
        })?;
        Self::new(args)
    }

    /// Argument templates, program first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Interpolate all templates, yielding the concrete argument vector.
    pub fn render(&self, fields: &Captures) -> Vec<String> {
        self.args.iter().map(|arg| interpolate(arg, fields)).collect()
    }

    async fn run(&self, fields: &Captures) -> std::result::Result<(), ActionError> {
        let argv = self.render(fields);
        let (program, rest) = match argv.split_first() {
            Some((program, rest)) if !program.is_empty() => (program, rest),
            _ => return Err(ActionError::EmptyProgram),
        };

        info!(program = %program, args = ?rest, "running action");

        let status = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ActionError::Spawn {
                program: program.clone(),
                source,
            })?
            .wait()
            .await
            .map_err(|source| ActionError::Wait {
                program: program.clone(),
                source,
            })?;

        debug!(program = %program, exit_code = ?status.code(), "action process exited");

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::ExitStatus {
                program: program.clone(),
                status,
            })
        }
    }
}

impl fmt::Display for ShellAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_words::join(&self.args))
    }
}

impl Action for ShellAction {
    fn act<'a>(&'a self, fields: &'a Captures) -> ActFuture<'a> {
        Box::pin(self.run(fields))
    }
}
