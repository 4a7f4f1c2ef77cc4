/*!
 * Queue snapshot persistence.
 *
 * This module provides:
 * - Key-value storage backends standing in for client-local storage
 * - The snapshot store with its freshness window
 */

pub mod storage;
pub mod store;

// Re-export main types
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{PersistedSnapshot, PersistenceStore, DEFAULT_SNAPSHOT_KEY, DEFAULT_SNAPSHOT_TTL};
