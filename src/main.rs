//! nines-pinger
//!
//! Probes a list of monitored URLs and records the results.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (TOML) ──▶ targets ──▶ ┌──────────────────────────────────────────┐
//!                                 │             BatchDispatcher              │
//!                                 │                                          │
//!                                 │  per target (bounded by semaphore):      │
//!                                 │    HEAD ──▶ executor ──▶ Outcome         │
//!                                 │              │                           │
//!                                 │              ├──▶ event log              │
//!                                 │              └──▶ status >= threshold?   │
//!                                 │                     GET ──▶ error log    │
//!                                 │                                          │
//!                                 │  ConnectionLifecycle:                    │
//!                                 │    open ─▶ drain guards ─▶ grace ─▶ close│
//!                                 └──────────────────────────────────────────┘
//!                                                   │
//!                                                   ▼
//!                                    LogStore (jsonl files | memory)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use clap::Parser;

use nines_pinger::config::{load_config, StoreKind};
use nines_pinger::dispatcher::{BatchDispatcher, DispatchSettings};
use nines_pinger::lifecycle::{signals, Shutdown};
use nines_pinger::observability::{logging, metrics};
use nines_pinger::probe::HttpExecutor;
use nines_pinger::scheduler::BatchScheduler;
use nines_pinger::store::build_store;
use nines_pinger::target::MonitorTarget;

#[derive(Parser)]
#[command(name = "nines-pinger")]
#[command(about = "Probe monitored URLs and log the results", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "pinger.toml")]
    config: PathBuf,

    /// Keep results in memory instead of the configured store.
    #[arg(long)]
    dry_run: bool,

    /// Run a single batch even if an interval is configured.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if cli.dry_run {
        config.store.kind = StoreKind::Memory;
    }

    logging::init_logging(&config.observability);
    tracing::info!(
        config = ?cli.config,
        targets = config.targets.len(),
        threshold = config.probe.status_code_threshold,
        store = ?config.store.kind,
        "nines-pinger v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let targets: Vec<MonitorTarget> = config.targets.iter().map(MonitorTarget::from).collect();
    let executor = Arc::new(HttpExecutor::new(config.probe.request_timeout())?);
    let store = build_store(&config.store);
    let dispatcher = BatchDispatcher::new(executor, store, DispatchSettings::from_config(&config));

    let interval = config.schedule.interval_secs;
    if cli.once || interval == 0 {
        let summary = dispatcher.run(targets).await?;
        println!(
            "batch {}: {} targets, {} probed, {} skipped, {} escalated, {} without response",
            summary.run_id,
            summary.batch_size,
            summary.dispatched,
            summary.skipped,
            summary.escalated,
            summary.transport_failures
        );
        return Ok(());
    }

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_listener(shutdown.clone());

    let scheduler = BatchScheduler::new(dispatcher, targets, Duration::from_secs(interval));
    scheduler.run(shutdown.subscribe()).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
