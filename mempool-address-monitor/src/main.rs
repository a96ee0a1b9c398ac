// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Mempool Address Monitor
//!
//! Runs exactly one reconciliation cycle and exits. Repetition is left to an
//! external scheduler (cron, systemd timer, Kubernetes CronJob).
//!
//! ```text
//!   config ──► AddressMonitor ──► MempoolApiClient   (per address)
//!                    │      └───► TelegramNotifier   (per event batch)
//!                    └──────────► JsonFileStore      (load once, save once)
//! ```

use anyhow::Context;
use clap::Parser;
use mempool_address_monitor::config::MonitorConfig;
use mempool_address_monitor::cycle::AddressMonitor;
use mempool_address_monitor::metrics::{push_metrics, MonitorMetrics};
use mempool_address_monitor::source::MempoolApiClient;
use mempool_address_monitor::store::JsonFileStore;
use mempool_address_monitor::telegram::TelegramNotifier;
use prometheus::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[clap(rename_all = "kebab-case", author, version)]
struct Args {
    /// YAML config file. Without it, configuration is read from
    /// BITCOIN_ADDRESS_n / BITCOIN_ALIAS_n and related variables.
    #[clap(env = "MONITOR_CONFIG", long)]
    config: Option<PathBuf>,
    /// Overrides the state file location from the config
    #[clap(env = "TX_DATABASE_FILE", long)]
    state_file: Option<PathBuf>,
    /// Overrides the mempool API base URL from the config
    #[clap(env = "MEMPOOL_API_URL", long)]
    mempool_api_url: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::from_env(),
    };
    if let Some(state_file) = &args.state_file {
        config.state_file = state_file.clone();
    }
    if let Some(url) = &args.mempool_api_url {
        config.mempool_api_url = url.clone();
    }
    config.validate().context("Invalid monitor configuration")
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    tracing::info!(
        "[Main] Watching {} address(es) via {}, state file {:?}",
        config.addresses.len(),
        config.mempool_api_url,
        config.state_file
    );

    let source = Arc::new(MempoolApiClient::new(
        &config.mempool_api_url,
        config.request_timeout(),
    )?);
    let notifier = Arc::new(TelegramNotifier::new(config.telegram.clone())?);
    if !notifier.is_configured() {
        tracing::warn!("[Main] Telegram not configured, notifications will only be logged");
    }
    let store = Arc::new(JsonFileStore::new(config.state_file.clone()));

    let registry = Registry::new();
    let metrics = MonitorMetrics::new(&registry)?;

    let monitor = AddressMonitor::new(&config, source, notifier, store).with_metrics(metrics);
    let result = monitor.run_cycle().await;

    if result.error_count > 0 || !result.persisted {
        tracing::warn!(
            "[Main] Cycle finished with {} fetch error(s), persisted={}",
            result.error_count,
            result.persisted
        );
    }

    if let Some(metrics_config) = &config.metrics {
        if let Err(e) = push_metrics(metrics_config, &registry).await {
            tracing::warn!("[Main] Failed to push metrics: {}", e);
        }
    }

    Ok(())
}
