//! ==============================================================================
//! main.rs - huinan merge entry point
//! ==============================================================================
//!
//! purpose:
//!     runs a single merge step and exits. meant to be driven by cron or a
//!     systemd timer; there is no long-lived process state.
//!
//! exit status:
//!     non-zero only when the merged history cannot be written (or an
//!     explicitly requested config file cannot be read). a failed fetch is
//!     a degraded but successful run.
//!
//! ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use huinan_merge::config::MergeConfig;
use huinan_merge::reconcile::{Insertion, MergeReport};
use std::path::PathBuf;
use time::UtcOffset;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "huinan-merge", version, about = "Merge remote huinan readings into the local history")]
struct Args {
    /// Config file (default: config/merge.toml, then ../config/merge.toml)
    #[arg(long, env = "HUINAN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the history file path
    #[arg(long, env = "HUINAN_STORE")]
    store: Option<PathBuf>,

    /// Override the remote snapshot url
    #[arg(long, env = "HUINAN_SOURCE_URL")]
    url: Option<String>,
}

fn main() -> Result<()> {
    // must be read while the process is still single-threaded
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let args = Args::parse();

    println!("===========================================================");
    println!("  huinan history merge");
    println!("===========================================================");

    // step 1: load configuration
    let mut config = match &args.config {
        Some(path) => MergeConfig::load(path)?,
        None => MergeConfig::load_or_default(),
    };
    if let Some(store) = args.store {
        config.storage.path = store;
    }
    if let Some(url) = args.url {
        config.source.url = url;
    }

    init_tracing(&config.logging.level);
    config.print_summary();

    // step 2: one merge step on a single-threaded runtime
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let report = runtime
        .block_on(huinan_merge::run(&config, local_offset))
        .context("merge run failed")?;

    print_report(&report);
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("huinan_merge={}", level)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_report(report: &MergeReport) {
    match &report.insertion {
        Insertion::Inserted { time } => info!(%time, "remote reading merged"),
        Insertion::Duplicate { time } => info!(%time, "remote reading already in history"),
        Insertion::NoSnapshot => info!("no remote reading this run, local history kept as is"),
    }

    if let Some(e) = &report.trim_skipped {
        info!("retention window skipped this run: {}", e);
    }

    info!(
        before = report.records_before,
        after = report.records_after,
        trimmed = report.trimmed,
        "merge complete"
    );
}
