// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transaction source backed by a mempool.space compatible (Esplora) API

use crate::error::{MonitorError, MonitorResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Source of the current unconfirmed transactions for an address
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch raw transaction payloads. One attempt, no retries.
    async fn fetch(&self, address: &str) -> MonitorResult<Vec<Value>>;
}

/// Client for `GET {base}/address/{address}/txs/mempool`
#[derive(Debug, Clone)]
pub struct MempoolApiClient {
    client: Client,
    base_url: String,
}

impl MempoolApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> MonitorResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn mempool_url(&self, address: &str) -> String {
        format!("{}/address/{}/txs/mempool", self.base_url, address)
    }
}

#[async_trait]
impl TransactionSource for MempoolApiClient {
    async fn fetch(&self, address: &str) -> MonitorResult<Vec<Value>> {
        let url = self.mempool_url(address);
        debug!("[MempoolApi] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::fetch(address, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            return Err(MonitorError::fetch(
                address,
                format!("HTTP {}: {}", status, body),
            ));
        }

        match response.json::<Value>().await {
            Ok(Value::Array(txs)) => Ok(txs),
            Ok(other) => Err(MonitorError::fetch(
                address,
                format!("expected a JSON array, got {}", json_kind(&other)),
            )),
            Err(e) => Err(MonitorError::fetch(address, e)),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
