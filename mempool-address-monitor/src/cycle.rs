// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cycle orchestration
//!
//! One cycle is a single sequential pass over the configured addresses:
//!
//! ```text
//!   load store ──► for each address:
//!                    fetch ──► parse ──► reconcile ──► notify new / confirmed
//!                  ──► save store (once)
//! ```
//!
//! Failures are contained where they happen. A failed fetch keeps the
//! address's stored snapshot for the next cycle, a failed delivery is only
//! logged, and a failed save leaves the previous state file in place. The
//! monitor holds no locks, so callers must not run overlapping cycles against
//! the same store.

use crate::config::{MonitorConfig, WatchedAddress};
use crate::format::{format_message, EventKind};
use crate::metrics::MonitorMetrics;
use crate::reconcile::{build_snapshot, parse_records, reconcile, AddressSnapshot};
use crate::source::TransactionSource;
use crate::store::{load_or_empty, GlobalSnapshot, SnapshotStore};
use crate::telegram::Notifier;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleResult {
    /// Addresses fetched and reconciled
    pub processed_count: usize,
    /// Addresses whose fetch failed
    pub error_count: usize,
    pub delivery_failures: usize,
    pub skipped_records: usize,
    pub new_count: usize,
    pub confirmed_count: usize,
    /// Whether the updated store was saved
    pub persisted: bool,
}

pub struct AddressMonitor {
    addresses: Vec<WatchedAddress>,
    source: Arc<dyn TransactionSource>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn SnapshotStore>,
    metrics: Option<MonitorMetrics>,
}

impl AddressMonitor {
    pub fn new(
        config: &MonitorConfig,
        source: Arc<dyn TransactionSource>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            addresses: config.addresses.clone(),
            source,
            notifier,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn addresses(&self) -> &[WatchedAddress] {
        &self.addresses
    }

    /// Run one pass over all addresses and persist the result
    pub async fn run_cycle(&self) -> CycleResult {
        let stored = load_or_empty(self.store.as_ref()).await;
        let mut updated = GlobalSnapshot::new();
        let mut result = CycleResult::default();

        for watched in &self.addresses {
            let address = watched.address.as_str();
            let previous = stored.get(address);
            info!("[Cycle] Fetching transactions for address: {}", address);

            let raw = match self.source.fetch(address).await {
                Ok(raw) => raw,
                Err(e) => {
                    error!("[Cycle] {}", e);
                    result.error_count += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.fetch_errors.with_label_values(&[address]).inc();
                    }
                    updated.insert(address.to_string(), previous.cloned().unwrap_or_default());
                    continue;
                }
            };

            let parsed = parse_records(address, raw);
            result.skipped_records += parsed.skipped;
            if let Some(metrics) = &self.metrics {
                metrics.malformed_records.inc_by(parsed.skipped as u64);
            }

            let empty = AddressSnapshot::new();
            let batch = reconcile(previous.unwrap_or(&empty), &parsed.records);
            result.new_count += batch.new.len();
            result.confirmed_count += batch.confirmed.len();

            self.report(watched, EventKind::New, &batch.new, &mut result)
                .await;
            self.report(watched, EventKind::Confirmed, &batch.confirmed, &mut result)
                .await;

            let snapshot = build_snapshot(parsed.records);
            if let Some(metrics) = &self.metrics {
                metrics
                    .tracked_transactions
                    .with_label_values(&[address])
                    .set(snapshot.len() as i64);
            }
            updated.insert(address.to_string(), snapshot);
            result.processed_count += 1;
        }

        match self.store.save(&updated).await {
            Ok(()) => result.persisted = true,
            Err(e) => {
                error!(
                    "[Cycle] Error saving transactions, previous state kept: {}",
                    e
                );
                if let Some(metrics) = &self.metrics {
                    metrics.persist_errors.inc();
                }
            }
        }

        info!(
            "[Cycle] Completed: processed={}, fetch_errors={}, new={}, confirmed={}, \
            delivery_failures={}, skipped_records={}, persisted={}",
            result.processed_count,
            result.error_count,
            result.new_count,
            result.confirmed_count,
            result.delivery_failures,
            result.skipped_records,
            result.persisted
        );
        result
    }

    async fn report(
        &self,
        watched: &WatchedAddress,
        kind: EventKind,
        txids: &BTreeSet<String>,
        result: &mut CycleResult,
    ) {
        if txids.is_empty() {
            return;
        }

        info!(
            "[Cycle] {} transaction(s) for {}: {:?}",
            kind.name(),
            watched.display_name(),
            txids
        );
        if let Some(metrics) = &self.metrics {
            let counter = match kind {
                EventKind::New => &metrics.new_transactions,
                EventKind::Confirmed => &metrics.confirmed_transactions,
            };
            counter
                .with_label_values(&[watched.address.as_str()])
                .inc_by(txids.len() as u64);
        }

        let message = format_message(
            &watched.address,
            watched.alias.as_deref(),
            txids.iter().map(String::as_str),
            kind,
        );

        let status = match self.notifier.send(&message).await {
            Ok(()) => "sent",
            Err(e) => {
                warn!(
                    "[Cycle] Failed to deliver {} notification for {}: {}",
                    kind.name(),
                    watched.display_name(),
                    e
                );
                result.delivery_failures += 1;
                "failed"
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics
                .notifications
                .with_label_values(&[kind.name(), status])
                .inc();
        }
    }
}
