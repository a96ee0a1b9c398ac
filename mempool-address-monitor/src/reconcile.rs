// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Snapshot reconciliation
//!
//! Compares the last stored view of an address's unconfirmed transactions
//! with a freshly fetched one and classifies the delta:
//!
//! ```text
//!   stored IDs ──┐
//!                ├─► new       = fresh − stored
//!   fresh IDs  ──┘   confirmed = stored − fresh
//! ```
//!
//! ## Known limitation
//!
//! A transaction that leaves the unconfirmed view is reported as confirmed.
//! The mempool API does not distinguish block inclusion from eviction or
//! replace-by-fee, so those cases are also reported as confirmed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Field carrying the transaction identifier in API payloads
pub const TXID_FIELD: &str = "txid";

/// Transaction payload as returned by the mempool API.
///
/// Only `txid` is interpreted. The rest of the payload is kept verbatim and
/// written back to the snapshot file unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct TransactionRecord {
    txid: String,
    payload: Value,
}

impl TransactionRecord {
    /// Accept a payload only if it is an object with a non-empty string `txid`
    pub fn from_value(payload: Value) -> Option<Self> {
        let txid = payload
            .get(TXID_FIELD)
            .and_then(Value::as_str)
            .filter(|txid| !txid.is_empty())?
            .to_string();
        Some(Self { txid, payload })
    }

    pub fn txid(&self) -> &str {
        &self.txid
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl TryFrom<Value> for TransactionRecord {
    type Error = String;

    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        Self::from_value(payload).ok_or_else(|| format!("record without a '{}' string", TXID_FIELD))
    }
}

impl From<TransactionRecord> for Value {
    fn from(record: TransactionRecord) -> Self {
        record.payload
    }
}

/// Transaction ID → record, for one address
pub type AddressSnapshot = BTreeMap<String, TransactionRecord>;

/// Records that passed ID extraction, plus the count of rejected ones
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<TransactionRecord>,
    pub skipped: usize,
}

/// Extract usable records from raw API payloads.
///
/// Payloads without a usable `txid` are skipped and counted; the rest of the
/// batch is still processed.
pub fn parse_records(address: &str, raw: Vec<Value>) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    for payload in raw {
        match TransactionRecord::from_value(payload) {
            Some(record) => parsed.records.push(record),
            None => {
                parsed.skipped += 1;
            }
        }
    }
    if parsed.skipped > 0 {
        warn!(
            "[Reconcile] Skipped {} malformed record(s) for {}",
            parsed.skipped, address
        );
    }
    parsed
}

/// Index records by transaction ID. Later duplicates replace earlier ones.
pub fn build_snapshot(records: impl IntoIterator<Item = TransactionRecord>) -> AddressSnapshot {
    records
        .into_iter()
        .map(|record| (record.txid.clone(), record))
        .collect()
}

/// Result of reconciling one address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBatch {
    /// Present in the fresh snapshot, absent from the stored one
    pub new: BTreeSet<String>,
    /// Present in the stored snapshot, absent from the fresh one
    pub confirmed: BTreeSet<String>,
}

impl EventBatch {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.confirmed.is_empty()
    }
}

/// Classify the delta between a stored snapshot and freshly fetched records
pub fn reconcile(stored: &AddressSnapshot, fresh: &[TransactionRecord]) -> EventBatch {
    let fresh_ids: BTreeSet<&str> = fresh.iter().map(TransactionRecord::txid).collect();

    let new = fresh_ids
        .iter()
        .filter(|txid| !stored.contains_key(**txid))
        .map(|txid| txid.to_string())
        .collect();

    let confirmed = stored
        .keys()
        .filter(|txid| !fresh_ids.contains(txid.as_str()))
        .cloned()
        .collect();

    EventBatch { new, confirmed }
}
