mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, format_match, format_signature, resolve_signatures};
use magicscan::{CancellationToken, ScanOptions, Scanner};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Scan {
            root,
            signatures,
            workers,
            timeout,
            limit,
            json,
        } => run_scan(root, signatures, workers, timeout, limit, json),
        Commands::ListSignatures { signatures } => list_signatures(signatures),
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let default_level = if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_scan(
    root: PathBuf,
    signatures: Option<PathBuf>,
    workers: Option<usize>,
    timeout: Option<u64>,
    limit: Option<u64>,
    json: bool,
) -> Result<()> {
    let signatures = resolve_signatures(signatures.as_deref())
        .context("Failed to load signatures")?;

    let token = match timeout {
        Some(secs) => CancellationToken::with_timeout(Duration::from_secs(secs)),
        None => CancellationToken::new(),
    };

    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        handler_token.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;

    let mut options = ScanOptions::default();
    if let Some(n) = workers {
        options = options.with_workers(n);
    }

    let printed = AtomicU64::new(0);

    let report = Scanner::new(options)
        .search(&token, &root, &signatures, |path, file_type| {
            let seen = printed.fetch_add(1, Ordering::SeqCst) + 1;
            if limit.is_some_and(|max| seen > max) {
                return false;
            }

            let line = format_match(path, file_type, json);
            if writeln!(io::stdout().lock(), "{}", line).is_err() {
                return false;
            }

            limit.is_none_or(|max| seen < max)
        })
        .with_context(|| format!("Scan of {} failed", root.display()))?;

    eprintln!(
        "Scanned {} files in {:.1}s: {} matches, {} unreadable entries{}",
        report.files_scanned,
        report.elapsed.as_secs_f64(),
        report.matches,
        report.walk_errors,
        if report.stopped_early { " (stopped early)" } else { "" }
    );

    for fault in &report.faults {
        eprintln!("Warning: {}", fault);
    }

    Ok(())
}

fn list_signatures(signatures: Option<PathBuf>) -> Result<()> {
    let signatures = resolve_signatures(signatures.as_deref())
        .context("Failed to load signatures")?;

    let mut out = io::stdout().lock();
    writeln!(out, "{:<8} {:>6}  PATTERN", "NAME", "OFFSET")?;
    writeln!(out, "{}", "-".repeat(40))?;
    for signature in &signatures {
        writeln!(out, "{}", format_signature(signature))?;
    }
    Ok(())
}
