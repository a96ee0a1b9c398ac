// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics for one monitor run
//!
//! The process runs a single cycle and exits, so nothing is scraped. Instead
//! the registry is pushed once to a Pushgateway at the end of the run.

use crate::config::MetricsPushConfig;
use crate::error::{MonitorError, MonitorResult};
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_vec_with_registry, Encoder, IntCounter, IntCounterVec, IntGaugeVec,
    Registry, TextEncoder,
};
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug)]
pub struct MonitorMetrics {
    pub(crate) fetch_errors: IntCounterVec,
    pub(crate) new_transactions: IntCounterVec,
    pub(crate) confirmed_transactions: IntCounterVec,
    pub(crate) notifications: IntCounterVec,
    pub(crate) malformed_records: IntCounter,
    pub(crate) persist_errors: IntCounter,
    pub(crate) tracked_transactions: IntGaugeVec,
}

impl MonitorMetrics {
    pub fn new(registry: &Registry) -> MonitorResult<Self> {
        Ok(Self {
            fetch_errors: register_int_counter_vec_with_registry!(
                "mempool_monitor_fetch_errors_total",
                "Failed mempool API fetches",
                &["address"],
                registry,
            )?,
            new_transactions: register_int_counter_vec_with_registry!(
                "mempool_monitor_new_transactions_total",
                "Transactions first seen in the mempool",
                &["address"],
                registry,
            )?,
            confirmed_transactions: register_int_counter_vec_with_registry!(
                "mempool_monitor_confirmed_transactions_total",
                "Transactions that left the mempool view",
                &["address"],
                registry,
            )?,
            notifications: register_int_counter_vec_with_registry!(
                "mempool_monitor_notifications_total",
                "Notification delivery attempts by kind and outcome",
                &["kind", "status"],
                registry,
            )?,
            malformed_records: register_int_counter_with_registry!(
                "mempool_monitor_malformed_records_total",
                "API records skipped for lacking a transaction id",
                registry,
            )?,
            persist_errors: register_int_counter_with_registry!(
                "mempool_monitor_persist_errors_total",
                "Failed snapshot saves",
                registry,
            )?,
            tracked_transactions: register_int_gauge_vec_with_registry!(
                "mempool_monitor_tracked_transactions",
                "Unconfirmed transactions currently tracked per address",
                &["address"],
                registry,
            )?,
        })
    }
}

/// Encode the registry in the Prometheus text format
pub fn encode_registry(registry: &Registry) -> MonitorResult<Vec<u8>> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Push the registry to `{push_url}/metrics/job/{job_name}`, replacing the
/// previous push for the job
pub async fn push_metrics(config: &MetricsPushConfig, registry: &Registry) -> MonitorResult<()> {
    let body = encode_registry(registry)?;
    let url = format!(
        "{}/metrics/job/{}",
        config.push_url.trim_end_matches('/'),
        config.job_name
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let mut request = client
        .put(&url)
        .header(reqwest::header::CONTENT_TYPE, TextEncoder::new().format_type())
        .body(body);
    if let Some(username) = &config.auth_username {
        request = request.basic_auth(username, Some(&config.auth_password));
    }

    let response = request
        .send()
        .await
        .map_err(|e| MonitorError::Metrics(prometheus::Error::Msg(e.to_string())))?;
    if !response.status().is_success() {
        return Err(MonitorError::Metrics(prometheus::Error::Msg(format!(
            "Pushgateway returned HTTP {}",
            response.status()
        ))));
    }

    info!("[Metrics] Pushed metrics to {}", url);
    Ok(())
}
