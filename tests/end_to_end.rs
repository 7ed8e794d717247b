use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use logtrigger::engine::{Runtime, Trigger, WatchTarget};
use logtrigger::errors::LogTriggerError;
use logtrigger::watch::TailOptions;
use logtrigger_test_utils::fake_action::{invoked_names, new_invocations, RecordingAction};
use logtrigger_test_utils::{eventually, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

fn fast() -> TailOptions {
    TailOptions {
        poll_interval: Duration::from_millis(20),
        channel_capacity: 16,
        ..TailOptions::default()
    }
}

fn append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(text.as_bytes())?;
    f.flush()
}

/// Long enough for several poll intervals to pass.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn matching_line_runs_action_once_with_captures() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("f.log");
    fs::write(&log, "")?;

    let inv = new_invocations();
    let target = WatchTarget::new(
        &log,
        vec![Trigger::new("ERROR: {msg}", Arc::new(RecordingAction::new("notify", inv.clone())))?],
    );

    let watches = Runtime::new(vec![target], fast()).start().await?;

    append(&log, "ERROR: disk full\n")?;
    assert!(eventually(Duration::from_secs(5), || inv.lock().unwrap().len() == 1).await);
    settle().await;

    {
        let guard = inv.lock().unwrap();
        assert_eq!(guard.len(), 1);
        assert_eq!(guard[0].1.get("msg").map(String::as_str), Some("disk full"));
    }

    watches.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn non_matching_line_runs_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("f.log");
    fs::write(&log, "")?;

    let inv = new_invocations();
    let target = WatchTarget::new(
        &log,
        vec![Trigger::new("ERROR: {msg}", Arc::new(RecordingAction::new("notify", inv.clone())))?],
    );

    let watches = Runtime::new(vec![target], fast()).start().await?;

    append(&log, "INFO: ok\n")?;
    settle().await;
    assert!(inv.lock().unwrap().is_empty());

    watches.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn targets_are_independent() -> TestResult {
    let dir = tempfile::tempdir()?;
    let first = dir.path().join("first.log");
    let second = dir.path().join("second.log");
    fs::write(&first, "")?;
    fs::write(&second, "")?;

    let inv = new_invocations();
    let targets = vec![
        WatchTarget::new(
            &first,
            vec![Trigger::new("*", Arc::new(RecordingAction::new("first", inv.clone())))?],
        ),
        WatchTarget::new(
            &second,
            vec![Trigger::new("*", Arc::new(RecordingAction::new("second", inv.clone())))?],
        ),
    ];

    let watches = Runtime::new(targets, fast()).start().await?;
    assert_eq!(watches.len(), 2);

    append(&second, "hello\n")?;
    assert!(eventually(Duration::from_secs(5), || !inv.lock().unwrap().is_empty()).await);
    settle().await;

    assert_eq!(invoked_names(&inv), vec!["second"]);

    watches.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn lines_written_before_start_never_trigger() -> TestResult {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("f.log");
    fs::write(&log, "ERROR: stale\n")?;

    let inv = new_invocations();
    let target = WatchTarget::new(
        &log,
        vec![Trigger::new("ERROR: {msg}", Arc::new(RecordingAction::new("notify", inv.clone())))?],
    );

    let watches = Runtime::new(vec![target], fast()).start().await?;
    settle().await;
    assert!(inv.lock().unwrap().is_empty());

    append(&log, "ERROR: fresh\n")?;
    assert!(eventually(Duration::from_secs(5), || !inv.lock().unwrap().is_empty()).await);
    settle().await;

    {
        let guard = inv.lock().unwrap();
        assert_eq!(guard.len(), 1);
        assert_eq!(guard[0].1.get("msg").map(String::as_str), Some("fresh"));
    }

    watches.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_targets_in_reverse_start_order() -> TestResult {
    let dir = tempfile::tempdir()?;
    let paths: Vec<_> = ["a.log", "b.log", "c.log"]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();

    let inv = new_invocations();
    let mut targets = Vec::new();
    for path in &paths {
        fs::write(path, "")?;
        targets.push(WatchTarget::new(
            path,
            vec![Trigger::new("*", Arc::new(RecordingAction::new("any", inv.clone())))?],
        ));
    }

    let watches = Runtime::new(targets, fast()).start().await?;
    assert_eq!(
        watches.paths(),
        paths.iter().map(|p| p.as_path()).collect::<Vec<_>>()
    );

    let stopped = watches.shutdown().await?;
    let expected: Vec<_> = paths.iter().rev().cloned().collect();
    assert_eq!(stopped, expected);
    Ok(())
}

#[tokio::test]
async fn run_until_returns_after_shutdown_signal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("f.log");
    fs::write(&log, "")?;

    let inv = new_invocations();
    let target = WatchTarget::new(
        &log,
        vec![Trigger::new("{line}", Arc::new(RecordingAction::new("echo", inv.clone())))?],
    );

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let runtime = tokio::spawn(Runtime::new(vec![target], fast()).run_until(async move {
        let _ = rx.await;
    }));

    // Give the runtime a moment to establish the watch.
    settle().await;
    append(&log, "seen\n")?;
    assert!(eventually(Duration::from_secs(5), || !inv.lock().unwrap().is_empty()).await);

    tx.send(()).map_err(|_| "runtime already gone")?;
    tokio::time::timeout(Duration::from_secs(5), runtime).await???;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn shell_action_runs_real_process_with_captured_field() -> TestResult {
    use logtrigger::exec::ShellAction;

    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("f.log");
    let out = dir.path().join("out.txt");
    fs::write(&log, "")?;

    let action = ShellAction::new([
        "sh",
        "-c",
        r#"printf '%s\n' "$1" >> "$2""#,
        "sh",
        "{msg}",
        out.to_str().ok_or("non-utf8 temp path")?,
    ])?;
    let target = WatchTarget::new(&log, vec![Trigger::new("ERROR: {msg}", Arc::new(action))?]);

    let watches = Runtime::new(vec![target], fast()).start().await?;

    append(&log, "ERROR: disk full; echo injected\n")?;
    assert!(eventually(Duration::from_secs(5), || out.exists()).await);
    settle().await;

    assert_eq!(fs::read_to_string(&out)?, "disk full; echo injected\n");

    watches.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn failed_start_rolls_back_targets_already_running() -> TestResult {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("first.log");
    let not_a_file = dir.path().join("subdir");
    fs::write(&log, "")?;
    fs::create_dir(&not_a_file)?;

    let inv = new_invocations();
    let targets = vec![
        WatchTarget::new(
            &log,
            vec![Trigger::new("*", Arc::new(RecordingAction::new("first", inv.clone())))?],
        ),
        WatchTarget::new(
            &not_a_file,
            vec![Trigger::new("*", Arc::new(RecordingAction::new("second", inv.clone())))?],
        ),
    ];

    match Runtime::new(targets, fast()).start().await {
        Err(LogTriggerError::ConfigError(msg)) => {
            assert!(msg.contains(&not_a_file.display().to_string()), "{msg}")
        }
        Err(e) => panic!("expected ConfigError, got {e:?}"),
        Ok(_) => panic!("a directory must not be watchable"),
    }

    // The first target was stopped again: new lines reach nobody.
    append(&log, "after failed start\n")?;
    settle().await;
    assert!(inv.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn shutdown_reports_targets_that_did_not_stop_cleanly() -> TestResult {
    let dir = tempfile::tempdir()?;
    let healthy = dir.path().join("healthy.log");
    let broken = dir.path().join("broken.log");
    fs::write(&healthy, "")?;
    fs::write(&broken, "")?;

    let inv = new_invocations();
    let targets = vec![
        WatchTarget::new(
            &healthy,
            vec![Trigger::new("*", Arc::new(RecordingAction::new("healthy", inv.clone())))?],
        ),
        WatchTarget::new(
            &broken,
            vec![Trigger::new("*", Arc::new(RecordingAction::panicking("broken", inv.clone())))?],
        ),
    ];

    let watches = Runtime::new(targets, fast()).start().await?;

    append(&broken, "boom\n")?;
    assert!(eventually(Duration::from_secs(5), || !inv.lock().unwrap().is_empty()).await);

    let err = match watches.shutdown().await {
        Err(err) => err,
        Ok(stopped) => panic!("expected a shutdown failure, stopped cleanly: {stopped:?}"),
    };
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].0, broken);
    assert!(err.to_string().contains("1 watch(es) failed to stop"));
    Ok(())
}
