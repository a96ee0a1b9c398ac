// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types shared by the monitor components

use thiserror::Error;

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors raised by the monitor's collaborators.
///
/// None of these abort a cycle. The orchestrator logs them and degrades per
/// address (fetch), per message (delivery) or per cycle (persistence).
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to fetch mempool transactions for {address}: {reason}")]
    Fetch { address: String, reason: String },

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Snapshot persistence failed: {0}")]
    Persistence(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn fetch(address: &str, reason: impl std::fmt::Display) -> Self {
        MonitorError::Fetch {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}
