use std::error::Error;

use logtrigger::errors::{ActionError, LogTriggerError};
use logtrigger::exec::{Action, ShellAction};
use logtrigger::pattern::Captures;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn empty_argument_list_is_rejected() {
    let result = ShellAction::new(Vec::<String>::new());
    assert!(matches!(result, Err(LogTriggerError::ConfigError(_))));
}

#[test]
fn command_line_is_split_with_shell_quoting() -> TestResult {
    let action = ShellAction::from_command_line(r#"notify-send "disk {msg}" -u critical"#)?;
    assert_eq!(
        action.args(),
        &["notify-send", "disk {msg}", "-u", "critical"]
    );
    let shown = action.to_string();
    assert!(shown.starts_with("notify-send "));
    assert!(shown.contains("disk {msg}"));
    Ok(())
}

#[test]
fn blank_or_unbalanced_command_line_is_rejected() {
    assert!(ShellAction::from_command_line("   ").is_err());
    assert!(ShellAction::from_command_line(r#"echo "unbalanced"#).is_err());
}

#[tokio::test]
async fn program_interpolated_to_empty_is_an_error() -> TestResult {
    let action = ShellAction::new(["{prog}", "arg"])?;
    let result = action.act(&Captures::new()).await;
    assert!(matches!(result, Err(ActionError::EmptyProgram)));
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() -> TestResult {
    let action = ShellAction::new(["logtrigger-definitely-not-a-real-program-xyz"])?;
    let result = action.act(&Captures::new()).await;
    assert!(matches!(result, Err(ActionError::Spawn { .. })));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn non_zero_exit_is_reported() -> TestResult {
    let action = ShellAction::new(["sh", "-c", "exit 3"])?;
    match action.act(&Captures::new()).await {
        Err(ActionError::ExitStatus { program, status }) => {
            assert_eq!(program, "sh");
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("expected ExitStatus error, got {other:?}"),
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn successful_command_is_ok() -> TestResult {
    let action = ShellAction::new(["true"])?;
    action.act(&Captures::new()).await?;
    Ok(())
}
