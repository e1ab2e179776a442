//! DiskWatch: live disk usage tracker.
//!
//! Thin binary entry point. All logic lives in the `diskwatch-core` crate.
//! Scans one directory and prints every session message as a JSON line on
//! stdout; logs go to stderr.
//!
//! ```text
//! diskwatch <PATH> [--config <FILE>] [--once]
//! ```
//!
//! `--once` disables watching and exits after the initial scan.

use anyhow::Context;
use clap::Parser;
use diskwatch_core::scanner::FsEnumerator;
use diskwatch_core::{ScanController, ScanMessage, SessionConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "diskwatch", version, about)]
struct Args {
    /// Directory to scan and watch
    root: PathBuf,

    /// JSON session config (debounce_ms, max_wait_ms, top_files_page, ...)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Exit after the initial scan instead of watching for changes
    #[arg(long)]
    once: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialise structured logging. Stdout carries the JSON feed.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if args.once {
        config.watch = false;
    }

    tracing::info!("DiskWatch starting on {}", args.root.display());

    let mut controller = ScanController::new(config, Arc::new(FsEnumerator));
    let session = controller
        .start(&args.root)
        .with_context(|| format!("cannot scan {}", args.root.display()))?;

    let stdout = std::io::stdout();
    for message in session.messages().iter() {
        let finished = matches!(message, ScanMessage::Finished { .. });
        let stopped = matches!(message, ScanMessage::Stopped);

        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &message)?;
        writeln!(out)?;
        out.flush()?;

        if stopped || (finished && args.once) {
            break;
        }
    }

    controller.stop();
    Ok(())
}
