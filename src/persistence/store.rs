/*!
 * Best-effort snapshot persistence.
 *
 * The store writes the durable subset of the queue under a single key and
 * discards snapshots older than its time-to-live on load. Storage failures are
 * logged and swallowed: persistence is advisory, never authoritative.
 */

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::queue::models::QueueItem;

use super::storage::{KeyValueStorage, MemoryStorage};

/// Default storage key for the queue snapshot
pub const DEFAULT_SNAPSHOT_KEY: &str = "translation_queue";

/// Default snapshot time-to-live: one hour
pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(60 * 60);

/// Durable form of the queue written to storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    /// Items not yet started
    #[serde(default)]
    pub pending: Vec<QueueItem>,
    /// Items translated successfully
    #[serde(default)]
    pub completed: Vec<QueueItem>,
    /// Items that failed
    #[serde(default)]
    pub failed: Vec<QueueItem>,
    /// Whether the queue was paused
    #[serde(default)]
    pub paused: bool,
    /// Item that was mid-translation when the snapshot was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<QueueItem>,
    /// When the snapshot was written
    pub saved_at: DateTime<Utc>,
}

impl PersistedSnapshot {
    /// Snapshot stamped with the current time
    pub fn capture(
        pending: Vec<QueueItem>,
        completed: Vec<QueueItem>,
        failed: Vec<QueueItem>,
        paused: bool,
        interrupted: Option<QueueItem>,
    ) -> Self {
        Self {
            pending,
            completed,
            failed,
            paused,
            interrupted,
            saved_at: Utc::now(),
        }
    }

    /// Whether the snapshot is older than `ttl` at `now`
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match now.signed_duration_since(self.saved_at).to_std() {
            Ok(age) => age > ttl,
            // Saved "in the future" (clock skew): not stale
            Err(_) => false,
        }
    }
}

/// Saves, loads and clears the queue snapshot under a fixed key
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    ttl: Duration,
}

impl PersistenceStore {
    /// Store writing under `key` with the given time-to-live
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            storage,
            key: key.into(),
            ttl,
        }
    }

    /// Store backed by process memory with default key and TTL
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            DEFAULT_SNAPSHOT_KEY,
            DEFAULT_SNAPSHOT_TTL,
        )
    }

    /// Key the snapshot is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Write the snapshot; failures are logged, never returned
    pub fn save(&self, snapshot: &PersistedSnapshot) {
        let encoded = match serde_json::to_string(snapshot) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Could not encode queue snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.key, &encoded) {
            warn!("Could not save queue state: {}", e);
        }
    }

    /// Load the snapshot if present, decodable and fresh
    pub fn load(&self) -> Option<PersistedSnapshot> {
        self.load_at(Utc::now())
    }

    /// Load the snapshot as if the current time were `now`
    pub fn load_at(&self, now: DateTime<Utc>) -> Option<PersistedSnapshot> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not load queue state: {}", e);
                return None;
            }
        };

        let snapshot: PersistedSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Discarding unreadable queue state: {}", e);
                return None;
            }
        };

        if snapshot.is_stale(now, self.ttl) {
            debug!(
                "Discarding queue state saved at {} (older than {:?})",
                snapshot.saved_at, self.ttl
            );
            return None;
        }

        Some(snapshot)
    }

    /// Remove the snapshot; failures are logged, never returned
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(&self.key) {
            warn!("Could not clear queue state: {}", e);
        }
    }
}
