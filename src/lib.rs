// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pattern;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::engine::{Runtime, WatchTarget};
use crate::watch::build_watch_targets;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - compiling triggers into watch targets
/// - one tail + dispatcher per watched file
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config_path();
    info!(config = %config_path.display(), "loading configuration");
    let cfg = load_and_validate(&config_path)?;

    let root_dir = config_root_dir(&config_path);
    let targets = build_watch_targets(&cfg, &root_dir)?;

    if args.dry_run {
        print_dry_run(&cfg, &targets);
        return Ok(());
    }

    let runtime = Runtime::new(targets, cfg.tail().to_options());
    runtime.run_until(ctrl_c()).await?;
    Ok(())
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed, never
/// resolves, so the process keeps running until killed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Base directory for relative watch paths when the config has no `root`.
///
/// - If the config path has a non-empty parent (e.g. "conf/logtrigger.toml"),
///   we use that directory.
/// - If it's just a bare filename, we fall back to the current working
///   directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print files, patterns and commands.
fn print_dry_run(cfg: &ConfigFile, targets: &[WatchTarget]) {
    println!("logtrigger dry-run");
    if let Some(root) = cfg.root() {
        println!("  root = {}", root.display());
    }
    println!("  tail.poll_interval_ms = {}", cfg.tail().poll_interval_ms);
    println!("  tail.channel_capacity = {}", cfg.tail().channel_capacity);
    println!("  tail.max_line_bytes = {}", cfg.tail().max_line_bytes);
    println!();

    println!("files ({}):", targets.len());
    for target in targets {
        println!("  - {}", target.path.display());
        for trigger in &target.triggers {
            println!("      pattern: {}", trigger.pattern());
            if !trigger.pattern().fields().is_empty() {
                println!("      fields: {:?}", trigger.pattern().fields());
            }
            println!("      action: {}", trigger.action());
        }
    }

    debug!("dry-run complete (nothing watched)");
}
