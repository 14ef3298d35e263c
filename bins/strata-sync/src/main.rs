//! Sync entry point.
//!
//! Mirrors the remote node into the local cache store under a per-target
//! advisory lock. Targets: `index` (the chain mirror) and `market`
//! (external scrapers hold the lock discipline, refresh is delegated).

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use tracing::{error, info};

use strata_gateway::RpcHttpClient;
use strata_index::lock::SyncLock;
use strata_index::sync::{SyncConfig, SyncDriver, SyncMode};
use strata_core::error::LockError;
use strata_store::CacheStore;

#[derive(Parser, Debug)]
#[command(
    name = "strata-sync",
    version,
    about = "Incremental chain sync into the local cache store"
)]
struct Args {
    /// Sync target: "index" or "market"
    target: Option<String>,

    /// Sync mode: "update" (default), "check", or "reindex"
    mode: Option<String>,

    /// Cache store directory
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Directory for advisory lock files
    #[arg(long, default_value = "./tmp")]
    lock_dir: PathBuf,

    /// Node JSON-RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9332")]
    rpc_endpoint: String,

    /// Node RPC username
    #[arg(long)]
    rpc_user: Option<String>,

    /// Node RPC password
    #[arg(long)]
    rpc_pass: Option<String>,

    /// Coin tag for stats and rich-list documents
    #[arg(long, default_value = "strata")]
    coin: String,

    /// Delay between block iterations in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Start height for check mode
    #[arg(long, default_value_t = 0)]
    check_from: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn print_usage() {
    println!("Usage: strata-sync <index|market> [update|check|reindex]");
    println!();
    println!("  index update    sync from the last cached height (default)");
    println!("  index check     re-walk from the configured checkpoint, filling gaps");
    println!("  index reindex   clear mirrored state and resync from genesis");
    println!("  market          take the market lock; refresh is delegated");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let Some(target) = args.target.clone() else {
        print_usage();
        return;
    };
    if target != "index" && target != "market" {
        print_usage();
        return;
    }

    // Market forces update mode; invalid modes fall back to usage.
    let mode = if target == "market" {
        SyncMode::Update
    } else {
        match args.mode.as_deref() {
            None => SyncMode::Update,
            Some(raw) => match SyncMode::from_str(raw) {
                Ok(mode) => mode,
                Err(()) => {
                    print_usage();
                    return;
                }
            },
        }
    };

    let lock = match SyncLock::acquire(&args.lock_dir, &target) {
        Ok(lock) => lock,
        Err(LockError::Held(target)) => {
            info!(target, "sync already in progress, try again later");
            return;
        }
        Err(e) => {
            error!(error = %e, "unable to create lock file");
            process::exit(1);
        }
    };

    if target == "market" {
        info!("market refresh is handled by external collectors; nothing to do");
        release(lock);
        return;
    }

    let store = match CacheStore::open(&args.data_dir) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open cache store");
            release(lock);
            process::exit(1);
        }
    };

    let credentials = match (args.rpc_user.clone(), args.rpc_pass.clone()) {
        (Some(user), Some(pass)) => Some((user, pass)),
        _ => None,
    };
    let node = RpcHttpClient::new(&args.rpc_endpoint, credentials);

    let config = SyncConfig {
        coin: args.coin.clone(),
        check_from: args.check_from,
        delay_ms: args.delay_ms,
        ..SyncConfig::default()
    };
    let driver = SyncDriver::new(&node, &store, config);

    info!(
        target,
        mode = ?mode,
        data_dir = %args.data_dir.display(),
        rpc = %args.rpc_endpoint,
        "starting sync"
    );

    // The lock must come off even when interrupted mid-run.
    let outcome = tokio::select! {
        result = driver.run(mode) => result,
        _ = shutdown_signal() => {
            info!("interrupted, releasing lock");
            release(lock);
            return;
        }
    };

    match outcome {
        Ok(report) => {
            info!(
                start = report.start,
                tip = report.tip,
                cached = report.cached,
                skipped = report.skipped,
                "sync complete"
            );
            release(lock);
        }
        Err(e) => {
            error!(error = %e, "sync failed");
            release(lock);
            process::exit(1);
        }
    }
}

/// Resolves on SIGINT or SIGTERM, so supervisor stops also release the lock.
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

fn release(lock: SyncLock) {
    if let Err(e) = lock.release() {
        error!(error = %e, "failed to remove lock file");
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}
