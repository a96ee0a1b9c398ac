// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Snapshot persistence
//!
//! The whole address → snapshot map is loaded once per cycle and written back
//! once at the end. `JsonFileStore` writes through a temporary file in the
//! target directory and renames it into place, so a crash mid-write never
//! leaves a truncated state file behind.

use crate::error::{MonitorError, MonitorResult};
use crate::reconcile::AddressSnapshot;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Address → last observed unconfirmed transactions
pub type GlobalSnapshot = BTreeMap<String, AddressSnapshot>;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted store. An absent store is an empty map.
    async fn load(&self) -> MonitorResult<GlobalSnapshot>;

    /// Replace the persisted store as one unit
    async fn save(&self, snapshot: &GlobalSnapshot) -> MonitorResult<()>;
}

/// Load a store, treating any failure as an empty store
pub async fn load_or_empty(store: &dyn SnapshotStore) -> GlobalSnapshot {
    match store.load().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("[Store] Failed to load snapshot, starting empty: {}", e);
            GlobalSnapshot::new()
        }
    }
}

/// Pretty-printed JSON file store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    file_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn write_atomic(&self, contents: &[u8]) -> MonitorResult<()> {
        let dir = match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.file_path)
            .map_err(|e| MonitorError::Persistence(e.error.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> MonitorResult<GlobalSnapshot> {
        if !self.file_path.exists() {
            info!(
                "[Store] No state file at {:?}, starting with an empty snapshot",
                self.file_path
            );
            return Ok(GlobalSnapshot::new());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let snapshot: GlobalSnapshot = serde_json::from_str(&contents)?;
        let tracked: usize = snapshot.values().map(|txs| txs.len()).sum();
        info!(
            "[Store] Loaded {} address(es), {} tracked transaction(s) from {:?}",
            snapshot.len(),
            tracked,
            self.file_path
        );
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &GlobalSnapshot) -> MonitorResult<()> {
        let contents = serde_json::to_vec_pretty(snapshot)?;
        self.write_atomic(&contents).map_err(|e| match e {
            MonitorError::Persistence(_) => e,
            other => MonitorError::Persistence(other.to_string()),
        })
    }
}

/// In-memory store, for embedding the monitor and for tests
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<GlobalSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: GlobalSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    /// Last saved snapshot, if any
    pub fn current(&self) -> Option<GlobalSnapshot> {
        self.snapshot.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> MonitorResult<GlobalSnapshot> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| MonitorError::Persistence(e.to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    async fn save(&self, snapshot: &GlobalSnapshot) -> MonitorResult<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| MonitorError::Persistence(e.to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}
